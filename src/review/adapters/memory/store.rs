//! Thread-safe in-memory review store with transactional writes.

use super::state::ReviewState;
use crate::review::{
    domain::{PullRequest, PullRequestId, ReviewStats, Team, TeamId, TeamName, User, UserId},
    ports::{ReviewStore, ReviewStoreResult, ReviewTransaction},
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// In-memory review store.
///
/// Transactions hold the store lock from [`ReviewStore::begin`] until commit
/// or drop, so writers are fully serialized and a transaction's reads are
/// never stale. Writes are staged on a copy of the state and only published
/// on commit.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReviewStore {
    state: Arc<Mutex<ReviewState>>,
}

impl InMemoryReviewStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReviewStore for InMemoryReviewStore {
    type Transaction = InMemoryReviewTransaction;

    async fn begin(&self) -> ReviewStoreResult<Self::Transaction> {
        let committed = Arc::clone(&self.state).lock_owned().await;
        let staged = committed.clone();
        Ok(InMemoryReviewTransaction { committed, staged })
    }

    async fn find_user(&self, id: &UserId) -> ReviewStoreResult<Option<User>> {
        Ok(self.state.lock().await.user(id))
    }

    async fn active_team_member_ids(
        &self,
        team_id: TeamId,
        exclude: &UserId,
    ) -> ReviewStoreResult<Vec<UserId>> {
        Ok(self.state.lock().await.active_member_ids(team_id, exclude))
    }

    async fn find_team_by_name(&self, name: &TeamName) -> ReviewStoreResult<Option<Team>> {
        Ok(self.state.lock().await.team_by_name(name))
    }

    async fn find_pull_request(
        &self,
        id: &PullRequestId,
    ) -> ReviewStoreResult<Option<PullRequest>> {
        Ok(self.state.lock().await.pull_request(id))
    }

    async fn list_by_reviewer(&self, reviewer: &UserId) -> ReviewStoreResult<Vec<PullRequest>> {
        Ok(self.state.lock().await.by_reviewer(reviewer))
    }

    async fn stats(&self) -> ReviewStoreResult<ReviewStats> {
        Ok(self.state.lock().await.stats())
    }
}

/// Transaction over an [`InMemoryReviewStore`].
///
/// Dropping the transaction without committing discards the staged state.
#[derive(Debug)]
pub struct InMemoryReviewTransaction {
    committed: OwnedMutexGuard<ReviewState>,
    staged: ReviewState,
}

#[async_trait]
impl ReviewTransaction for InMemoryReviewTransaction {
    async fn insert_team(&mut self, name: &TeamName) -> ReviewStoreResult<TeamId> {
        self.staged.insert_team(name)
    }

    async fn find_team_name(&mut self, team_id: TeamId) -> ReviewStoreResult<Option<TeamName>> {
        Ok(self.staged.team_name(team_id))
    }

    async fn find_user(&mut self, id: &UserId) -> ReviewStoreResult<Option<User>> {
        Ok(self.staged.user(id))
    }

    async fn insert_user(&mut self, user: &User) -> ReviewStoreResult<()> {
        self.staged.insert_user(user)
    }

    async fn update_user(&mut self, user: &User) -> ReviewStoreResult<()> {
        self.staged.update_user(user)
    }

    async fn insert_pull_request(&mut self, pull_request: &PullRequest) -> ReviewStoreResult<()> {
        self.staged.insert_pull_request(pull_request)
    }

    async fn update_pull_request(&mut self, pull_request: &PullRequest) -> ReviewStoreResult<()> {
        self.staged.update_pull_request(pull_request)
    }

    async fn lock_pull_request(
        &mut self,
        id: &PullRequestId,
    ) -> ReviewStoreResult<Option<PullRequest>> {
        // The whole store is already held exclusively by this transaction.
        Ok(self.staged.pull_request(id))
    }

    async fn add_reviewer(
        &mut self,
        pull_request: &PullRequestId,
        reviewer: &UserId,
    ) -> ReviewStoreResult<()> {
        self.staged.add_reviewer(pull_request, reviewer)
    }

    async fn remove_reviewer(
        &mut self,
        pull_request: &PullRequestId,
        reviewer: &UserId,
    ) -> ReviewStoreResult<()> {
        self.staged.remove_reviewer(pull_request, reviewer)
    }

    async fn commit(self) -> ReviewStoreResult<()> {
        let Self {
            mut committed,
            staged,
        } = self;
        *committed = staged;
        debug!("in-memory review transaction committed");
        Ok(())
    }

    async fn rollback(self) -> ReviewStoreResult<()> {
        debug!("in-memory review transaction rolled back");
        Ok(())
    }
}
