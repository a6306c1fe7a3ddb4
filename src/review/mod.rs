//! Reviewer assignment and pull request lifecycle management.
//!
//! This module assigns code reviewers to pull requests from the author's
//! team, tracks the `OPEN` → `MERGED` lifecycle, swaps reviewers on request
//! and keeps team rosters synchronized with user records. It follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Persistence gateway contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
