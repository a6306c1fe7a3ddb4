//! `PostgreSQL` adapters for reviewer assignment persistence.

mod models;
mod queries;
mod repository;
mod schema;

pub use repository::{PostgresReviewStore, PostgresReviewTransaction, ReviewPgPool};

/// DDL creating every table the `PostgreSQL` store relies on.
pub const SCHEMA_SQL: &str =
    include_str!("../../../../migrations/2026-10-01-000000_create_review_tables/up.sql");
