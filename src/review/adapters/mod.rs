//! Adapter implementations of the review persistence gateway.

pub mod memory;
pub mod postgres;
