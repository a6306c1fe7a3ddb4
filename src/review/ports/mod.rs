//! Port contracts for reviewer assignment.
//!
//! Ports define the infrastructure-agnostic persistence gateway used by the
//! review services.

pub mod store;

pub use store::{ReviewStore, ReviewStoreError, ReviewStoreResult, ReviewTransaction};
