//! Helpers for finishing transactions.

use super::ReviewResult;
use crate::review::ports::ReviewTransaction;
use tracing::warn;

/// Commits `transaction` when `outcome` succeeded and rolls it back
/// otherwise. The original failure wins over a rollback failure.
pub(super) async fn finish<Tx, T>(
    transaction: Tx,
    operation: &'static str,
    outcome: ReviewResult<T>,
) -> ReviewResult<T>
where
    Tx: ReviewTransaction,
{
    match outcome {
        Ok(value) => {
            transaction.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = transaction.rollback().await {
                warn!(operation, error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}
