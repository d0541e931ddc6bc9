//! Search descriptor for listing and counting incoming phone numbers.

use serde::{Deserialize, Serialize};

use crate::error::{ProvisioningError, ValidationError};
use crate::id::{AccountSid, OrganizationSid};

/// How the `friendly_name` and `phone_number` fields of a filter are matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchFilterMode {
    /// Phone number must match exactly; friendly name is a substring.
    #[default]
    Exact,
    /// Friendly name is a substring; phone number must match exactly.
    FriendlyName,
    /// Both fields are patterns where `*` matches any run of characters and
    /// `?` matches a single character.
    Wildcard,
}

/// Criteria for a search over incoming phone numbers.
///
/// A filter must be scoped to an account, an organization or both (see
/// [`IncomingPhoneNumberFilter::validate`]). Every other `None` field places
/// no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingPhoneNumberFilter {
    pub account_sid: Option<AccountSid>,
    pub organization_sid: Option<OrganizationSid>,
    pub friendly_name: Option<String>,
    pub phone_number: Option<String>,
    pub mode: SearchFilterMode,
    /// Maximum number of records to return; `None` is unbounded.
    pub limit: Option<u32>,
    pub offset: u32,
}

impl IncomingPhoneNumberFilter {
    /// Filter scoped to a single account.
    #[must_use]
    pub fn for_account(account_sid: AccountSid) -> Self {
        Self {
            account_sid: Some(account_sid),
            ..Self::default()
        }
    }

    /// Filter scoped to a single organization.
    #[must_use]
    pub fn for_organization(organization_sid: OrganizationSid) -> Self {
        Self {
            organization_sid: Some(organization_sid),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn friendly_name(mut self, friendly_name: impl Into<String>) -> Self {
        self.friendly_name = Some(friendly_name.into());
        self
    }

    #[must_use]
    pub fn phone_number(mut self, phone_number: impl Into<String>) -> Self {
        self.phone_number = Some(phone_number.into());
        self
    }

    #[must_use]
    pub fn mode(mut self, mode: SearchFilterMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn page(mut self, offset: u32, limit: u32) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }

    /// Check that the filter is scoped to at least one tenant.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingScope`] when both `account_sid` and
    /// `organization_sid` are absent.
    pub fn validate(&self) -> Result<(), ProvisioningError> {
        if self.account_sid.is_none() && self.organization_sid.is_none() {
            return Err(ValidationError::MissingScope.into());
        }
        Ok(())
    }
}
