//! Opaque URI value used for callback and resource URLs.
//!
//! Both absolute (`https://host/app`) and platform-relative
//! (`/2012-04-24/Accounts/…`) forms are stored, so no scheme is required.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors produced when parsing a [`Uri`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UriError {
    #[error("URI must not be empty")]
    Empty,

    #[error("URI must not contain whitespace")]
    Whitespace,
}

/// A callback or resource URI, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Uri(String);

impl Uri {
    /// Borrow the textual form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Uri {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(UriError::Empty);
        }
        if s.chars().any(char::is_whitespace) {
            return Err(UriError::Whitespace);
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for Uri {
    type Error = UriError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Uri> for String {
    fn from(value: Uri) -> Self {
        value.0
    }
}
