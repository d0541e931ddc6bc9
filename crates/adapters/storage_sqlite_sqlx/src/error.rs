//! Storage-specific error types wrapping sqlx errors and row decoding failures.

use provisioning_domain::error::ProvisioningError;
use provisioning_domain::id::SidError;
use provisioning_domain::uri::UriError;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query, connection, or transaction failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row could not be turned into a domain record.
    #[error("row mapping error")]
    Mapping(#[from] MappingError),
}

impl From<StorageError> for ProvisioningError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}

/// A row snapshot that does not describe a valid incoming phone number.
///
/// Only mandatory columns raise [`MappingError::MissingColumn`]; optional
/// columns fall back to their defaults when absent.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    #[error("mandatory column {0} is missing")]
    MissingColumn(&'static str),

    #[error("column {column} holds an invalid Sid")]
    InvalidSid {
        column: &'static str,
        #[source]
        source: SidError,
    },

    #[error("column {column} holds an invalid URI")]
    InvalidUri {
        column: &'static str,
        #[source]
        source: UriError,
    },

    #[error("column {column} holds an invalid RFC 3339 timestamp")]
    InvalidTimestamp {
        column: &'static str,
        #[source]
        source: chrono::ParseError,
    },
}

/// Errors raised while reading [`Config`](crate::pool::Config) from the
/// environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("PROVISIONING_DATABASE_URL is not set")]
    MissingDatabaseUrl(#[source] std::env::VarError),

    #[error("PROVISIONING_DATABASE_MAX_CONNECTIONS is not a positive integer")]
    InvalidMaxConnections(#[source] std::num::ParseIntError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_storage_error_to_domain_storage_variant() {
        let err: ProvisioningError = StorageError::from(MappingError::MissingColumn("sid")).into();
        assert!(matches!(err, ProvisioningError::Storage(_)));
    }

    #[test]
    fn should_name_missing_column_in_message() {
        let err = MappingError::MissingColumn("phone_number");
        assert_eq!(err.to_string(), "mandatory column phone_number is missing");
    }

    #[test]
    fn should_keep_sqlx_error_as_source() {
        let err = StorageError::from(sqlx::Error::RowNotFound);
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.downcast_ref::<sqlx::Error>().is_some());
    }
}
