//! Reviewer assigner: review assignment and pull request lifecycle engine.
//!
//! This crate picks code reviewers for pull requests from the author's team,
//! tracks each pull request from open to merged, and lets a reviewer be
//! swapped for another team member while keeping reviewer sets consistent
//! under concurrent requests.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for persistence
//! - **Adapters**: In-memory and `PostgreSQL` implementations of the ports
//! - **Services**: Transactional orchestration over the ports
//!
//! # Modules
//!
//! - [`review`]: Teams, users, pull requests and reviewer assignment
//! - [`config`]: Explicit runtime configuration

pub mod config;
pub mod review;
