//! Timestamps stamped on incoming phone numbers.
//!
//! `date_created` is set once when a number is registered and `date_updated`
//! on every update. Both are stored as RFC 3339 text with sub-second
//! precision, so a value read back compares equal to the one written.

use chrono::{DateTime, Utc};

/// UTC instant carried by `date_created` and `date_updated`.
pub type Timestamp = DateTime<Utc>;

/// Current instant, used by the provisioning service when it stamps records.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}
