//! Column codecs between raw `SQLite` values and typed domain fields.
//!
//! Every `read_*` accepts an absent (NULL or missing) value and yields an
//! absent or default typed value; only present-but-malformed values fail.
//! For present values `read_*(write_*(x)) == x`.

use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat};

use provisioning_domain::id::SidError;
use provisioning_domain::time::Timestamp;
use provisioning_domain::uri::Uri;

use crate::error::MappingError;

/// Value of a boolean flag column that is NULL or missing.
pub const DEFAULT_FLAG: bool = false;

pub fn read_sid<T>(column: &'static str, raw: Option<&str>) -> Result<Option<T>, MappingError>
where
    T: FromStr<Err = SidError>,
{
    raw.map(str::parse)
        .transpose()
        .map_err(|source| MappingError::InvalidSid { column, source })
}

pub fn write_sid<T: Display>(sid: Option<&T>) -> Option<String> {
    sid.map(ToString::to_string)
}

pub fn read_timestamp(
    column: &'static str,
    raw: Option<&str>,
) -> Result<Option<Timestamp>, MappingError> {
    raw.map(|text| DateTime::parse_from_rfc3339(text).map(|ts| ts.to_utc()))
        .transpose()
        .map_err(|source| MappingError::InvalidTimestamp { column, source })
}

/// Timestamps are written with full sub-second precision so the value read
/// back compares equal.
pub fn write_timestamp(ts: Option<&Timestamp>) -> Option<String> {
    ts.map(|ts| ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

pub fn read_uri(column: &'static str, raw: Option<&str>) -> Result<Option<Uri>, MappingError> {
    raw.map(str::parse)
        .transpose()
        .map_err(|source| MappingError::InvalidUri { column, source })
}

pub fn write_uri(uri: Option<&Uri>) -> Option<String> {
    uri.map(ToString::to_string)
}

#[must_use]
pub fn read_flag(raw: Option<bool>) -> bool {
    raw.unwrap_or(DEFAULT_FLAG)
}

#[must_use]
pub fn write_flag(flag: bool) -> Option<bool> {
    Some(flag)
}

/// Unwrap a mandatory column.
pub fn require<T>(column: &'static str, value: Option<T>) -> Result<T, MappingError> {
    value.ok_or(MappingError::MissingColumn(column))
}
