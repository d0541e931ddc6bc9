//! # provisioning-domain
//!
//! Pure domain model for incoming phone number provisioning.
//!
//! ## Responsibilities
//! - Foundational types: typed Sids, URIs, error conventions, timestamps
//! - Define **incoming phone numbers** with their per-channel routing
//! - Define the **search filter** used to list and count numbers
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;
pub mod uri;

pub mod filter;
pub mod phone_number;
