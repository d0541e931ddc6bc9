//! # provisioning-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement `IncomingPhoneNumberRepository` from `provisioning-app::ports::storage`
//! - Map between domain records and flat row snapshots
//! - Dispatch search filters to a fixed set of query shapes
//! - Manage `SQLite` connection pool lifecycle and embedded migrations
//!
//! ## Dependency rule
//! Depends on `provisioning-app` (for the port trait) and `provisioning-domain`
//! (for domain types). The `app` and `domain` crates must never reference this
//! adapter.

mod codec;
pub mod error;
pub mod incoming_phone_number_repo;
pub mod pool;
pub mod query;
pub mod row;

pub use error::StorageError;
pub use incoming_phone_number_repo::SqliteIncomingPhoneNumberRepository;
pub use pool::{Config, Database};
