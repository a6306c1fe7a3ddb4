//! Engine configuration.
//!
//! Configuration is parsed once at startup (flags or environment variables)
//! and handed to constructors explicitly; nothing reads it from ambient
//! global state.

use crate::review::services::ServiceSettings;
use clap::Args;
use std::time::Duration;

/// Top-level engine configuration.
#[derive(Debug, Clone, Args)]
pub struct EngineConfig {
    /// Database connection settings.
    #[command(flatten)]
    pub database: DatabaseSettings,

    /// Upper bound for a single engine operation, in seconds. Operations
    /// exceeding it are cancelled and their transaction rolled back.
    #[arg(long, env = "REVIEWER_OPERATION_TIMEOUT_SECS", default_value = "10")]
    pub operation_timeout_secs: u64,
}

impl EngineConfig {
    /// Returns the service settings derived from this configuration.
    #[must_use]
    pub const fn service_settings(&self) -> ServiceSettings {
        ServiceSettings::new(Duration::from_secs(self.operation_timeout_secs))
    }
}

/// `PostgreSQL` connection pool settings.
#[derive(Debug, Clone, Args)]
pub struct DatabaseSettings {
    /// `PostgreSQL` connection URL.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Maximum number of pooled connections.
    #[arg(long, env = "REVIEWER_POOL_MAX_SIZE", default_value = "25")]
    pub pool_max_size: u32,

    /// Number of idle connections kept open.
    #[arg(long, env = "REVIEWER_POOL_MIN_IDLE", default_value = "5")]
    pub pool_min_idle: u32,

    /// Maximum lifetime of a pooled connection, in seconds.
    #[arg(long, env = "REVIEWER_POOL_MAX_LIFETIME_SECS", default_value = "180")]
    pub max_lifetime_secs: u64,

    /// Idle time after which a pooled connection is closed, in seconds.
    #[arg(long, env = "REVIEWER_POOL_IDLE_TIMEOUT_SECS", default_value = "600")]
    pub idle_timeout_secs: u64,

    /// Time allowed to acquire a connection, in seconds.
    #[arg(long, env = "REVIEWER_POOL_CONNECT_TIMEOUT_SECS", default_value = "5")]
    pub connect_timeout_secs: u64,
}

impl DatabaseSettings {
    /// Creates settings for `database_url` with the default pool sizing.
    #[must_use]
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            pool_max_size: 25,
            pool_min_idle: 5,
            max_lifetime_secs: 180,
            idle_timeout_secs: 600,
            connect_timeout_secs: 5,
        }
    }

    /// Returns the maximum connection lifetime.
    #[must_use]
    pub const fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }

    /// Returns the idle timeout.
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Returns the connection acquisition timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
