//! Incoming phone number: a number provisioned to an account, with routing
//! configuration for each inbound channel.

use serde::{Deserialize, Serialize};

use crate::error::{ProvisioningError, ValidationError};
use crate::id::{AccountSid, ApplicationSid, IncomingPhoneNumberSid, OrganizationSid};
use crate::time::Timestamp;
use crate::uri::Uri;

/// Routing configuration for one inbound channel (voice, SMS, USSD, refer).
///
/// Fallback fields are independent of the primary ones: an absent fallback
/// URL stays absent even when the primary URL is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub url: Option<Uri>,
    pub method: Option<String>,
    pub fallback_url: Option<Uri>,
    pub fallback_method: Option<String>,
    pub application_sid: Option<ApplicationSid>,
    /// Display name of the linked application. Filled on reads from the
    /// applications relation and never persisted with the number.
    pub application_name: Option<String>,
}

impl ChannelConfig {
    /// Channel routed to `url` with the given HTTP method.
    #[must_use]
    pub fn new(url: Uri, method: impl Into<String>) -> Self {
        Self {
            url: Some(url),
            method: Some(method.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_fallback(mut self, url: Uri, method: impl Into<String>) -> Self {
        self.fallback_url = Some(url);
        self.fallback_method = Some(method.into());
        self
    }

    #[must_use]
    pub fn with_application(mut self, application_sid: ApplicationSid) -> Self {
        self.application_sid = Some(application_sid);
        self
    }
}

/// Media a number can carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Capabilities {
    pub voice: bool,
    pub sms: bool,
    pub mms: bool,
    pub fax: bool,
}

/// A phone number (or SIP address, or regex pattern) provisioned to an
/// account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingPhoneNumber {
    pub sid: IncomingPhoneNumberSid,
    pub account_sid: AccountSid,
    pub organization_sid: Option<OrganizationSid>,
    pub date_created: Option<Timestamp>,
    pub date_updated: Option<Timestamp>,
    pub friendly_name: Option<String>,
    pub phone_number: String,
    pub cost: Option<String>,
    pub api_version: Option<String>,
    pub uri: Option<Uri>,
    pub voice_caller_id_lookup: bool,
    pub voice: ChannelConfig,
    pub sms: ChannelConfig,
    pub ussd: ChannelConfig,
    pub refer: ChannelConfig,
    pub status_callback: Option<Uri>,
    pub status_callback_method: Option<String>,
    pub capabilities: Capabilities,
    pub pure_sip: bool,
}

impl IncomingPhoneNumber {
    /// Create a builder for constructing an [`IncomingPhoneNumber`].
    #[must_use]
    pub fn builder() -> IncomingPhoneNumberBuilder {
        IncomingPhoneNumberBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Validation`] when `phone_number` is blank.
    pub fn validate(&self) -> Result<(), ProvisioningError> {
        if self.phone_number.trim().is_empty() {
            return Err(ValidationError::EmptyPhoneNumber.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`IncomingPhoneNumber`].
#[derive(Debug, Default)]
pub struct IncomingPhoneNumberBuilder {
    sid: Option<IncomingPhoneNumberSid>,
    account_sid: Option<AccountSid>,
    organization_sid: Option<OrganizationSid>,
    date_created: Option<Timestamp>,
    date_updated: Option<Timestamp>,
    friendly_name: Option<String>,
    phone_number: Option<String>,
    cost: Option<String>,
    api_version: Option<String>,
    uri: Option<Uri>,
    voice_caller_id_lookup: bool,
    voice: ChannelConfig,
    sms: ChannelConfig,
    ussd: ChannelConfig,
    refer: ChannelConfig,
    status_callback: Option<Uri>,
    status_callback_method: Option<String>,
    capabilities: Capabilities,
    pure_sip: bool,
}

impl IncomingPhoneNumberBuilder {
    #[must_use]
    pub fn sid(mut self, sid: IncomingPhoneNumberSid) -> Self {
        self.sid = Some(sid);
        self
    }

    #[must_use]
    pub fn account_sid(mut self, account_sid: AccountSid) -> Self {
        self.account_sid = Some(account_sid);
        self
    }

    #[must_use]
    pub fn organization_sid(mut self, organization_sid: OrganizationSid) -> Self {
        self.organization_sid = Some(organization_sid);
        self
    }

    #[must_use]
    pub fn date_created(mut self, date_created: Timestamp) -> Self {
        self.date_created = Some(date_created);
        self
    }

    #[must_use]
    pub fn date_updated(mut self, date_updated: Timestamp) -> Self {
        self.date_updated = Some(date_updated);
        self
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
    pub fn cost(mut self, cost: impl Into<String>) -> Self {
        self.cost = Some(cost.into());
        self
    }

    #[must_use]
    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    #[must_use]
    pub fn uri(mut self, uri: Uri) -> Self {
        self.uri = Some(uri);
        self
    }

    #[must_use]
    pub fn voice_caller_id_lookup(mut self, enabled: bool) -> Self {
        self.voice_caller_id_lookup = enabled;
        self
    }

    #[must_use]
    pub fn voice(mut self, channel: ChannelConfig) -> Self {
        self.voice = channel;
        self
    }

    #[must_use]
    pub fn sms(mut self, channel: ChannelConfig) -> Self {
        self.sms = channel;
        self
    }

    #[must_use]
    pub fn ussd(mut self, channel: ChannelConfig) -> Self {
        self.ussd = channel;
        self
    }

    #[must_use]
    pub fn refer(mut self, channel: ChannelConfig) -> Self {
        self.refer = channel;
        self
    }

    #[must_use]
    pub fn status_callback(mut self, url: Uri, method: impl Into<String>) -> Self {
        self.status_callback = Some(url);
        self.status_callback_method = Some(method.into());
        self
    }

    #[must_use]
    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    #[must_use]
    pub fn pure_sip(mut self, pure_sip: bool) -> Self {
        self.pure_sip = pure_sip;
        self
    }

    /// Consume the builder, validate, and return an [`IncomingPhoneNumber`].
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Validation`] if the account is missing or
    /// the phone number is missing or blank.
    pub fn build(self) -> Result<IncomingPhoneNumber, ProvisioningError> {
        let account_sid = self.account_sid.ok_or(ValidationError::MissingAccount)?;
        let number = IncomingPhoneNumber {
            sid: self.sid.unwrap_or_default(),
            account_sid,
            organization_sid: self.organization_sid,
            date_created: self.date_created,
            date_updated: self.date_updated,
            friendly_name: self.friendly_name,
            phone_number: self.phone_number.unwrap_or_default(),
            cost: self.cost,
            api_version: self.api_version,
            uri: self.uri,
            voice_caller_id_lookup: self.voice_caller_id_lookup,
            voice: self.voice,
            sms: self.sms,
            ussd: self.ussd,
            refer: self.refer,
            status_callback: self.status_callback,
            status_callback_method: self.status_callback_method,
            capabilities: self.capabilities,
            pure_sip: self.pure_sip,
        };
        number.validate()?;
        Ok(number)
    }
}
