//! Read-only statistics.

use super::{ReviewResult, ServiceSettings, deadline::within_deadline};
use crate::review::{domain::ReviewStats, ports::ReviewStore};
use std::sync::Arc;

/// Aggregates counters over committed state.
#[derive(Clone)]
pub struct StatsService<S>
where
    S: ReviewStore,
{
    store: Arc<S>,
    settings: ServiceSettings,
}

impl<S> StatsService<S>
where
    S: ReviewStore,
{
    /// Creates a statistics service with default settings.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self::with_settings(store, ServiceSettings::default())
    }

    /// Creates a statistics service with explicit settings.
    #[must_use]
    pub const fn with_settings(store: Arc<S>, settings: ServiceSettings) -> Self {
        Self { store, settings }
    }

    /// Returns totals and per-reviewer assignment counts, busiest first.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::Persistence`](super::ReviewError::Persistence)
    /// when the store fails.
    pub async fn stats(&self) -> ReviewResult<ReviewStats> {
        within_deadline(self.settings, "stats", async {
            let mut stats = self.store.stats().await?;
            stats.sort_reviewers();
            Ok(stats)
        })
        .await
    }
}
