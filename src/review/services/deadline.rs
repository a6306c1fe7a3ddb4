//! Per-operation deadlines.

use super::{ReviewError, ReviewResult};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Runtime settings shared by every review service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSettings {
    operation_timeout: Duration,
}

impl ServiceSettings {
    /// Deadline applied when none is configured.
    pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates settings with the given per-operation deadline.
    #[must_use]
    pub const fn new(operation_timeout: Duration) -> Self {
        Self { operation_timeout }
    }

    /// Returns the per-operation deadline.
    #[must_use]
    pub const fn operation_timeout(self) -> Duration {
        self.operation_timeout
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::new(Self::DEFAULT_OPERATION_TIMEOUT)
    }
}

/// Drives `work` to completion or drops it once the deadline passes.
///
/// Dropping the future drops any transaction it holds, which rolls it back.
pub(super) async fn within_deadline<F, T>(
    settings: ServiceSettings,
    operation: &'static str,
    work: F,
) -> ReviewResult<T>
where
    F: Future<Output = ReviewResult<T>>,
{
    let limit = settings.operation_timeout();
    tokio::time::timeout(limit, work)
        .await
        .unwrap_or_else(|_elapsed| {
            warn!(
                operation,
                timeout_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                "review operation timed out"
            );
            Err(ReviewError::TimedOut(limit))
        })
}
