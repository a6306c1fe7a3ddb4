//! Reviewer candidate selection.

use super::{MissingResource, ReviewError, ReviewResult};
use crate::review::{
    domain::{MAX_REVIEWERS, UserId},
    ports::ReviewStore,
};
use rand::Rng;
use rand::seq::SliceRandom;
use std::sync::Arc;
use tracing::debug;

/// Picks up to `limit` entries of `pool` uniformly at random.
///
/// When the pool is no larger than `limit` it is returned unchanged.
/// Otherwise every `limit`-sized subset is equally likely.
#[must_use]
pub fn sample_without_replacement<R>(
    mut pool: Vec<UserId>,
    limit: usize,
    rng: &mut R,
) -> Vec<UserId>
where
    R: Rng + ?Sized,
{
    if pool.len() <= limit {
        return pool;
    }
    pool.shuffle(rng);
    pool.truncate(limit);
    pool
}

/// Chooses reviewers from the author's team.
///
/// Candidates are the active members of the author's team, never the author,
/// minus an exclusion set.
#[derive(Clone)]
pub struct ReviewerSelector<S>
where
    S: ReviewStore,
{
    store: Arc<S>,
}

impl<S> ReviewerSelector<S>
where
    S: ReviewStore,
{
    /// Creates a selector reading from `store`.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Selects at most `limit` reviewers for a pull request by `author`.
    ///
    /// `limit` is capped at [`MAX_REVIEWERS`]. An empty result is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::NotFound`] when the author does not exist and
    /// [`ReviewError::Persistence`] when the store fails.
    pub async fn select_reviewers(
        &self,
        author: &UserId,
        exclude: &[UserId],
        limit: usize,
    ) -> ReviewResult<Vec<UserId>> {
        let author_record = self
            .store
            .find_user(author)
            .await?
            .ok_or_else(|| ReviewError::NotFound(MissingResource::User(author.clone())))?;
        let mut pool = self
            .store
            .active_team_member_ids(author_record.team_id(), author)
            .await?;
        pool.retain(|candidate| !exclude.contains(candidate));
        let available = pool.len();
        let chosen =
            sample_without_replacement(pool, limit.min(MAX_REVIEWERS), &mut rand::thread_rng());
        debug!(
            author = %author,
            available,
            selected = chosen.len(),
            "selected reviewer candidates"
        );
        Ok(chosen)
    }
}
