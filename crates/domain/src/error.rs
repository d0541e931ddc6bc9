//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`ProvisioningError`] at port boundaries.

/// Top-level error returned by services and repository ports.
#[derive(Debug, thiserror::Error)]
pub enum ProvisioningError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A requested record does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// The underlying store failed. The boxed error is the adapter's own
    /// error type, with its source chain intact.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Domain invariant violations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The phone number is empty or only whitespace.
    #[error("phone number must not be empty")]
    EmptyPhoneNumber,

    /// No owning account was given.
    #[error("phone number must belong to an account")]
    MissingAccount,

    /// A search filter names neither an account nor an organization.
    #[error("search filter must be scoped to an account or an organization")]
    MissingScope,
}

/// A lookup by identifier found nothing.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}
