//! Persistence gateway for teams, users, pull requests and reviewer links.
//!
//! Reads on [`ReviewStore`] run outside any transaction and observe only
//! committed state. Every write goes through a [`ReviewTransaction`], which
//! is rolled back when dropped without [`ReviewTransaction::commit`].

use crate::review::domain::{
    PullRequest, PullRequestId, ReviewStats, Team, TeamId, TeamName, User, UserId,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for persistence gateway operations.
pub type ReviewStoreResult<T> = Result<T, ReviewStoreError>;

/// Non-transactional reads and transaction entry point.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Transaction handle produced by [`ReviewStore::begin`].
    type Transaction: ReviewTransaction;

    /// Opens a transaction.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewStoreError::Persistence`] when no transaction can be
    /// acquired.
    async fn begin(&self) -> ReviewStoreResult<Self::Transaction>;

    /// Finds a user by identifier.
    async fn find_user(&self, id: &UserId) -> ReviewStoreResult<Option<User>>;

    /// Returns identifiers of active members of `team_id`, except `exclude`.
    async fn active_team_member_ids(
        &self,
        team_id: TeamId,
        exclude: &UserId,
    ) -> ReviewStoreResult<Vec<UserId>>;

    /// Finds a team by name, including its members.
    async fn find_team_by_name(&self, name: &TeamName) -> ReviewStoreResult<Option<Team>>;

    /// Finds a pull request, including its reviewers.
    async fn find_pull_request(&self, id: &PullRequestId)
    -> ReviewStoreResult<Option<PullRequest>>;

    /// Returns every pull request `reviewer` is assigned to.
    async fn list_by_reviewer(&self, reviewer: &UserId) -> ReviewStoreResult<Vec<PullRequest>>;

    /// Computes aggregate statistics.
    async fn stats(&self) -> ReviewStoreResult<ReviewStats>;
}

/// A unit of work against the persistence gateway.
#[async_trait]
pub trait ReviewTransaction: Send {
    /// Inserts a team and returns its store-assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewStoreError::DuplicateTeam`] when the name is taken.
    async fn insert_team(&mut self, name: &TeamName) -> ReviewStoreResult<TeamId>;

    /// Returns the name of `team_id`.
    async fn find_team_name(&mut self, team_id: TeamId) -> ReviewStoreResult<Option<TeamName>>;

    /// Finds a user, observing writes made earlier in this transaction.
    async fn find_user(&mut self, id: &UserId) -> ReviewStoreResult<Option<User>>;

    /// Inserts a new user.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewStoreError::TeamNotFound`] when the owning team does
    /// not exist.
    async fn insert_user(&mut self, user: &User) -> ReviewStoreResult<()>;

    /// Overwrites name, active flag and team of an existing user.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewStoreError::UserNotFound`] when the user does not
    /// exist.
    async fn update_user(&mut self, user: &User) -> ReviewStoreResult<()>;

    /// Inserts a pull request row. Reviewer links are added separately.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewStoreError::DuplicatePullRequest`] when the identifier
    /// is taken and [`ReviewStoreError::UserNotFound`] when the author does
    /// not exist.
    async fn insert_pull_request(&mut self, pull_request: &PullRequest) -> ReviewStoreResult<()>;

    /// Persists status and merge timestamp of an existing pull request.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewStoreError::PullRequestNotFound`] when the pull
    /// request does not exist.
    async fn update_pull_request(&mut self, pull_request: &PullRequest) -> ReviewStoreResult<()>;

    /// Loads a pull request and holds exclusive access to it until the
    /// transaction ends.
    async fn lock_pull_request(
        &mut self,
        id: &PullRequestId,
    ) -> ReviewStoreResult<Option<PullRequest>>;

    /// Links `reviewer` to the pull request. Linking twice is a no-op.
    async fn add_reviewer(
        &mut self,
        pull_request: &PullRequestId,
        reviewer: &UserId,
    ) -> ReviewStoreResult<()>;

    /// Removes the link between `reviewer` and the pull request.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewStoreError::ReviewerNotAssigned`] when no link was
    /// removed.
    async fn remove_reviewer(
        &mut self,
        pull_request: &PullRequestId,
        reviewer: &UserId,
    ) -> ReviewStoreResult<()>;

    /// Makes every write of this transaction visible.
    async fn commit(self) -> ReviewStoreResult<()>;

    /// Discards every write of this transaction.
    async fn rollback(self) -> ReviewStoreResult<()>;
}

/// Errors returned by persistence gateway implementations.
#[derive(Debug, Clone, Error)]
pub enum ReviewStoreError {
    /// A team with the same name already exists.
    #[error("duplicate team name: {0}")]
    DuplicateTeam(TeamName),

    /// A pull request with the same identifier already exists.
    #[error("duplicate pull request identifier: {0}")]
    DuplicatePullRequest(PullRequestId),

    /// The team was not found.
    #[error("team not found: {0}")]
    TeamNotFound(TeamId),

    /// The user was not found.
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// The pull request was not found.
    #[error("pull request not found: {0}")]
    PullRequestNotFound(PullRequestId),

    /// No reviewer link existed for the pair.
    #[error("reviewer {reviewer} is not assigned to pull request {pull_request}")]
    ReviewerNotAssigned {
        /// Pull request identifier.
        pull_request: PullRequestId,
        /// Reviewer identifier.
        reviewer: UserId,
    },

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ReviewStoreError {
    /// Wraps a data-quality or deserialization error from persisted rows.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
