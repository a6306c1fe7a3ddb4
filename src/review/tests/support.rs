//! Shared fixtures and fault-injecting store wrappers for unit tests.

use crate::review::{
    adapters::memory::{InMemoryReviewStore, InMemoryReviewTransaction},
    domain::{
        PullRequest, PullRequestId, ReviewStats, Team, TeamId, TeamMember, TeamName, User, UserId,
    },
    ports::{ReviewStore, ReviewStoreError, ReviewStoreResult, ReviewTransaction},
    services::{CreateTeamRequest, ReviewResult, TeamMembershipService},
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub(super) fn user_id(raw: &str) -> UserId {
    UserId::new(raw).expect("valid user id")
}

pub(super) fn pr_id(raw: &str) -> PullRequestId {
    PullRequestId::new(raw).expect("valid pull request id")
}

pub(super) fn member(id: &str, active: bool) -> TeamMember {
    TeamMember::new(id, format!("User {id}"), active).expect("valid member")
}

/// Creates `name` with the given `(id, active)` roster through the service.
pub(super) async fn seed_team<S>(
    store: &Arc<S>,
    name: &str,
    roster: &[(&str, bool)],
) -> ReviewResult<Team>
where
    S: ReviewStore,
{
    let request = CreateTeamRequest::new(name)
        .with_members(roster.iter().map(|(id, active)| member(id, *active)));
    TeamMembershipService::new(Arc::clone(store))
        .create_team(request)
        .await
}

/// Failure modes injected by [`FaultyStore`].
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct Faults {
    /// Fail every reviewer link insert with a persistence error.
    pub fail_add_reviewer: bool,
    /// Fail every commit with a persistence error.
    pub fail_commit: bool,
    /// Sleep before each reviewer link insert.
    pub stall_add_reviewer: Option<Duration>,
}

/// In-memory store whose transactions misbehave on demand.
#[derive(Debug, Clone)]
pub(super) struct FaultyStore {
    pub inner: InMemoryReviewStore,
    pub faults: Faults,
}

impl FaultyStore {
    pub(super) fn new(faults: Faults) -> Self {
        Self {
            inner: InMemoryReviewStore::new(),
            faults,
        }
    }
}

fn injected() -> ReviewStoreError {
    ReviewStoreError::persistence(std::io::Error::other("injected failure"))
}

#[async_trait]
impl ReviewStore for FaultyStore {
    type Transaction = FaultyTransaction;

    async fn begin(&self) -> ReviewStoreResult<Self::Transaction> {
        Ok(FaultyTransaction {
            inner: self.inner.begin().await?,
            faults: self.faults,
        })
    }

    async fn find_user(&self, id: &UserId) -> ReviewStoreResult<Option<User>> {
        self.inner.find_user(id).await
    }

    async fn active_team_member_ids(
        &self,
        team_id: TeamId,
        exclude: &UserId,
    ) -> ReviewStoreResult<Vec<UserId>> {
        self.inner.active_team_member_ids(team_id, exclude).await
    }

    async fn find_team_by_name(&self, name: &TeamName) -> ReviewStoreResult<Option<Team>> {
        self.inner.find_team_by_name(name).await
    }

    async fn find_pull_request(
        &self,
        id: &PullRequestId,
    ) -> ReviewStoreResult<Option<PullRequest>> {
        self.inner.find_pull_request(id).await
    }

    async fn list_by_reviewer(&self, reviewer: &UserId) -> ReviewStoreResult<Vec<PullRequest>> {
        self.inner.list_by_reviewer(reviewer).await
    }

    async fn stats(&self) -> ReviewStoreResult<ReviewStats> {
        self.inner.stats().await
    }
}

#[derive(Debug)]
pub(super) struct FaultyTransaction {
    inner: InMemoryReviewTransaction,
    faults: Faults,
}

#[async_trait]
impl ReviewTransaction for FaultyTransaction {
    async fn insert_team(&mut self, name: &TeamName) -> ReviewStoreResult<TeamId> {
        self.inner.insert_team(name).await
    }

    async fn find_team_name(&mut self, team_id: TeamId) -> ReviewStoreResult<Option<TeamName>> {
        self.inner.find_team_name(team_id).await
    }

    async fn find_user(&mut self, id: &UserId) -> ReviewStoreResult<Option<User>> {
        self.inner.find_user(id).await
    }

    async fn insert_user(&mut self, user: &User) -> ReviewStoreResult<()> {
        self.inner.insert_user(user).await
    }

    async fn update_user(&mut self, user: &User) -> ReviewStoreResult<()> {
        self.inner.update_user(user).await
    }

    async fn insert_pull_request(&mut self, pull_request: &PullRequest) -> ReviewStoreResult<()> {
        self.inner.insert_pull_request(pull_request).await
    }

    async fn update_pull_request(&mut self, pull_request: &PullRequest) -> ReviewStoreResult<()> {
        self.inner.update_pull_request(pull_request).await
    }

    async fn lock_pull_request(
        &mut self,
        id: &PullRequestId,
    ) -> ReviewStoreResult<Option<PullRequest>> {
        self.inner.lock_pull_request(id).await
    }

    async fn add_reviewer(
        &mut self,
        pull_request: &PullRequestId,
        reviewer: &UserId,
    ) -> ReviewStoreResult<()> {
        if let Some(delay) = self.faults.stall_add_reviewer {
            tokio::time::sleep(delay).await;
        }
        if self.faults.fail_add_reviewer {
            return Err(injected());
        }
        self.inner.add_reviewer(pull_request, reviewer).await
    }

    async fn remove_reviewer(
        &mut self,
        pull_request: &PullRequestId,
        reviewer: &UserId,
    ) -> ReviewStoreResult<()> {
        self.inner.remove_reviewer(pull_request, reviewer).await
    }

    async fn commit(self) -> ReviewStoreResult<()> {
        if self.faults.fail_commit {
            return Err(injected());
        }
        self.inner.commit().await
    }

    async fn rollback(self) -> ReviewStoreResult<()> {
        self.inner.rollback().await
    }
}
