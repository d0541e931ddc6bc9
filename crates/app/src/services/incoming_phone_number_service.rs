//! Incoming phone number service: use-cases for provisioning numbers.

use provisioning_domain::error::{NotFoundError, ProvisioningError};
use provisioning_domain::filter::IncomingPhoneNumberFilter;
use provisioning_domain::id::{AccountSid, IncomingPhoneNumberSid};
use provisioning_domain::phone_number::IncomingPhoneNumber;
use provisioning_domain::time;

use crate::ports::IncomingPhoneNumberRepository;

/// One page of search results together with the unpaginated total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub numbers: Vec<IncomingPhoneNumber>,
    pub total: u64,
}

/// Application service for incoming phone number operations.
pub struct IncomingPhoneNumberService<R> {
    repo: R,
}

impl<R: IncomingPhoneNumberRepository> IncomingPhoneNumberService<R> {
    /// Create a new service backed by the given repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Register a new number after validating domain invariants.
    ///
    /// Missing creation and update timestamps are set to the current time.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Validation`] if invariants fail, or a
    /// storage error propagated from the repository.
    #[tracing::instrument(
        skip(self, number),
        fields(sid = %number.sid, phone_number = %number.phone_number)
    )]
    pub async fn register(
        &self,
        mut number: IncomingPhoneNumber,
    ) -> Result<IncomingPhoneNumber, ProvisioningError> {
        number.validate()?;
        let now = time::now();
        number.date_created.get_or_insert(now);
        number.date_updated.get_or_insert(now);
        self.repo.add(number.clone()).await?;
        Ok(number)
    }

    /// Look up a number by Sid, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::NotFound`] when no number with `sid`
    /// exists, or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get(
        &self,
        sid: IncomingPhoneNumberSid,
    ) -> Result<IncomingPhoneNumber, ProvisioningError> {
        self.repo.get(sid).await?.ok_or_else(|| {
            NotFoundError {
                entity: "IncomingPhoneNumber",
                id: sid.to_string(),
            }
            .into()
        })
    }

    /// List every number owned by an account.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_for_account(
        &self,
        account_sid: AccountSid,
    ) -> Result<Vec<IncomingPhoneNumber>, ProvisioningError> {
        self.repo.get_by_account(account_sid).await
    }

    /// Return one page of numbers matching `filter` and the total match count.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Validation`] if the filter has no account
    /// or organization scope, or a storage error from the repository.
    #[tracing::instrument(skip(self, filter), fields(mode = ?filter.mode))]
    pub async fn search(
        &self,
        filter: IncomingPhoneNumberFilter,
    ) -> Result<Page, ProvisioningError> {
        filter.validate()?;
        let total = self.repo.count(filter.clone()).await?;
        let numbers = self.repo.get_by_filter(filter).await?;
        Ok(Page { numbers, total })
    }

    /// Find the regex-provisioned numbers that route `filter.phone_number`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Validation`] if the filter has no account
    /// or organization scope, or a storage error from the repository.
    #[tracing::instrument(skip(self, filter), fields(phone_number = ?filter.phone_number))]
    pub async fn match_regex(
        &self,
        filter: IncomingPhoneNumberFilter,
    ) -> Result<Vec<IncomingPhoneNumber>, ProvisioningError> {
        filter.validate()?;
        self.repo.get_by_regex(filter).await
    }

    /// Update an existing number, stamping `date_updated`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Validation`] if invariants fail, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self, number), fields(sid = %number.sid))]
    pub async fn update(
        &self,
        mut number: IncomingPhoneNumber,
    ) -> Result<IncomingPhoneNumber, ProvisioningError> {
        number.validate()?;
        number.date_updated = Some(time::now());
        self.repo.update(number.clone()).await?;
        Ok(number)
    }

    /// Release a number by Sid.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn release(&self, sid: IncomingPhoneNumberSid) -> Result<(), ProvisioningError> {
        self.repo.remove(sid).await
    }

    /// Release every number owned by an account.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn release_all(&self, account_sid: AccountSid) -> Result<(), ProvisioningError> {
        self.repo.remove_by_account(account_sid).await
    }
}
