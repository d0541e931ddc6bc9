//! # provisioning-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define the **port trait** adapters must implement:
//!   - `IncomingPhoneNumberRepository`: CRUD and search over incoming numbers
//! - Define the **use-case** service:
//!   - `IncomingPhoneNumberService`: register, look up, search, update, release
//! - Orchestrate domain objects without knowing *how* persistence works
//!
//! ## Dependency rule
//! Depends on `provisioning-domain` only.
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod ports;
pub mod services;
