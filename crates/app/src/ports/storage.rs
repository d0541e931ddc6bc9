//! Storage port: repository trait for incoming phone number persistence.

use std::future::Future;

use provisioning_domain::error::ProvisioningError;
use provisioning_domain::filter::IncomingPhoneNumberFilter;
use provisioning_domain::id::{AccountSid, IncomingPhoneNumberSid};
use provisioning_domain::phone_number::IncomingPhoneNumber;

/// Repository for persisting and querying [`IncomingPhoneNumber`]s.
///
/// Every call is self-contained: implementations acquire their store
/// resources per call and release them before the returned future resolves,
/// whatever the outcome. Store failures are returned as
/// [`ProvisioningError::Storage`] without retries.
pub trait IncomingPhoneNumberRepository {
    /// Insert a new number.
    fn add(
        &self,
        number: IncomingPhoneNumber,
    ) -> impl Future<Output = Result<(), ProvisioningError>> + Send;

    /// Get a number by its Sid. A missing number is `Ok(None)`.
    fn get(
        &self,
        sid: IncomingPhoneNumberSid,
    ) -> impl Future<Output = Result<Option<IncomingPhoneNumber>, ProvisioningError>> + Send;

    /// Get every number owned by an account.
    fn get_by_account(
        &self,
        account_sid: AccountSid,
    ) -> impl Future<Output = Result<Vec<IncomingPhoneNumber>, ProvisioningError>> + Send;

    /// Get the numbers whose stored phone number is a regular expression
    /// fully matching `filter.phone_number`, within the filter's scope.
    ///
    /// Only the phone number is matched; `friendly_name`, `mode` and
    /// pagination are ignored. A filter without an account or organization
    /// is rejected with [`ValidationError::MissingScope`].
    ///
    /// [`ValidationError::MissingScope`]: provisioning_domain::error::ValidationError::MissingScope
    fn get_by_regex(
        &self,
        filter: IncomingPhoneNumberFilter,
    ) -> impl Future<Output = Result<Vec<IncomingPhoneNumber>, ProvisioningError>> + Send;

    /// Get one page of numbers matching `filter`, honouring its mode.
    /// Unscoped filters are rejected as in [`Self::get_by_regex`].
    fn get_by_filter(
        &self,
        filter: IncomingPhoneNumberFilter,
    ) -> impl Future<Output = Result<Vec<IncomingPhoneNumber>, ProvisioningError>> + Send;

    /// Count the numbers matching `filter`, ignoring pagination.
    /// Unscoped filters are rejected as in [`Self::get_by_regex`].
    fn count(
        &self,
        filter: IncomingPhoneNumberFilter,
    ) -> impl Future<Output = Result<u64, ProvisioningError>> + Send;

    /// Overwrite the stored number with the same Sid. Unknown Sids are a no-op.
    fn update(
        &self,
        number: IncomingPhoneNumber,
    ) -> impl Future<Output = Result<(), ProvisioningError>> + Send;

    /// Delete a number by Sid. Unknown Sids are a no-op.
    fn remove(
        &self,
        sid: IncomingPhoneNumberSid,
    ) -> impl Future<Output = Result<(), ProvisioningError>> + Send;

    /// Delete every number owned by an account.
    fn remove_by_account(
        &self,
        account_sid: AccountSid,
    ) -> impl Future<Output = Result<(), ProvisioningError>> + Send;
}
