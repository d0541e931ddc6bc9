//! Typed Sid newtypes backed by UUIDs.
//!
//! A Sid renders as a two-letter type prefix followed by the 32 lowercase hex
//! digits of its UUID, e.g. `PN0f3c…`. The prefix is checked on parse so an
//! account Sid can never be mistaken for a phone number Sid.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of hex digits following the prefix.
const BODY_LEN: usize = 32;

/// Errors produced when parsing a Sid from text.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SidError {
    /// The two-letter prefix does not match the expected Sid type.
    #[error("expected Sid prefix {expected}, found {found:?}")]
    WrongPrefix {
        expected: &'static str,
        found: String,
    },

    /// The part after the prefix is not 32 hex digits.
    #[error("malformed Sid body")]
    Malformed(#[source] uuid::Error),

    /// The body uses uppercase hex digits; only the lowercase form is
    /// canonical.
    #[error("Sid body must be lowercase hex")]
    Uppercase,

    /// The text is not prefix + 32 characters long.
    #[error("Sid must be {expected} characters long, got {actual}")]
    Length { expected: usize, actual: usize },
}

macro_rules! define_sid {
    ($(#[doc = $doc:expr])* $name:ident, $prefix:literal) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(uuid::Uuid);

        impl Default for $name {
            fn default() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl $name {
            /// Two-letter type prefix of this Sid.
            pub const PREFIX: &'static str = $prefix;

            /// Generate a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self::default()
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Access the inner UUID.
            #[must_use]
            pub fn as_uuid(self) -> uuid::Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", Self::PREFIX, self.0.simple())
            }
        }

        impl FromStr for $name {
            type Err = SidError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_body(s, Self::PREFIX).map(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = String::deserialize(deserializer)?;
                text.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

fn parse_body(s: &str, prefix: &'static str) -> Result<uuid::Uuid, SidError> {
    let expected = prefix.len() + BODY_LEN;
    if s.len() != expected {
        return Err(SidError::Length {
            expected,
            actual: s.len(),
        });
    }
    let Some(body) = s.strip_prefix(prefix) else {
        return Err(SidError::WrongPrefix {
            expected: prefix,
            found: s.chars().take(prefix.len()).collect(),
        });
    };
    if body.bytes().any(|b| b.is_ascii_uppercase()) {
        return Err(SidError::Uppercase);
    }
    uuid::Uuid::parse_str(body).map_err(SidError::Malformed)
}

define_sid!(
    /// Unique identifier for an [`IncomingPhoneNumber`](crate::phone_number::IncomingPhoneNumber).
    IncomingPhoneNumberSid,
    "PN"
);

define_sid!(
    /// Unique identifier for the account owning a number.
    AccountSid,
    "AC"
);

define_sid!(
    /// Unique identifier for the organization (tenant) owning a number.
    OrganizationSid,
    "OR"
);

define_sid!(
    /// Unique identifier for an application a channel can be linked to.
    ApplicationSid,
    "AP"
);
