//! In-memory persistence gateway for tests and embedded use.

mod state;
mod store;

pub use store::{InMemoryReviewStore, InMemoryReviewTransaction};
