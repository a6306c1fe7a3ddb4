//! Service-level error taxonomy.

use crate::review::{
    domain::{PullRequestId, ReviewDomainError, TeamId, TeamName, UserId},
    ports::ReviewStoreError,
};
use std::time::Duration;
use thiserror::Error;

/// The entity a lookup failed to find.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MissingResource {
    /// Team looked up by name.
    #[error("team {0}")]
    Team(TeamName),
    /// Team looked up by store identifier.
    #[error("team #{0}")]
    TeamId(TeamId),
    /// User.
    #[error("user {0}")]
    User(UserId),
    /// Pull request.
    #[error("pull request {0}")]
    PullRequest(PullRequestId),
}

/// Errors returned by review services.
#[derive(Debug, Clone, Error)]
pub enum ReviewError {
    /// A referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(MissingResource),

    /// A team with the requested name already exists.
    #[error("team {0} already exists")]
    TeamExists(TeamName),

    /// A pull request with the requested identifier already exists.
    #[error("pull request {0} already exists")]
    PullRequestExists(PullRequestId),

    /// The pull request is merged and its reviewers are frozen.
    #[error("pull request {0} is merged")]
    PullRequestMerged(PullRequestId),

    /// The named reviewer is not assigned to the pull request.
    #[error("reviewer {reviewer} is not assigned to pull request {pull_request}")]
    NotAssigned {
        /// Pull request identifier.
        pull_request: PullRequestId,
        /// Reviewer that was expected.
        reviewer: UserId,
    },

    /// No eligible replacement reviewer exists.
    #[error("no replacement reviewer available for pull request {0}")]
    NoCandidate(PullRequestId),

    /// Input validation or a domain invariant failed.
    #[error(transparent)]
    Domain(ReviewDomainError),

    /// The operation did not finish before its deadline.
    #[error("operation did not complete within {0:?}")]
    TimedOut(Duration),

    /// Unclassified persistence failure.
    #[error(transparent)]
    Persistence(ReviewStoreError),
}

/// Result type for review service operations.
pub type ReviewResult<T> = Result<T, ReviewError>;

impl ReviewError {
    /// Returns whether this error reports a missing entity.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<ReviewDomainError> for ReviewError {
    fn from(err: ReviewDomainError) -> Self {
        match err {
            ReviewDomainError::ReviewerNotAssigned {
                pull_request,
                reviewer,
            } => Self::NotAssigned {
                pull_request,
                reviewer,
            },
            ReviewDomainError::PullRequestMerged(id) => Self::PullRequestMerged(id),
            other => Self::Domain(other),
        }
    }
}

impl From<ReviewStoreError> for ReviewError {
    fn from(err: ReviewStoreError) -> Self {
        match err {
            ReviewStoreError::DuplicateTeam(name) => Self::TeamExists(name),
            ReviewStoreError::DuplicatePullRequest(id) => Self::PullRequestExists(id),
            ReviewStoreError::TeamNotFound(id) => Self::NotFound(MissingResource::TeamId(id)),
            ReviewStoreError::UserNotFound(id) => Self::NotFound(MissingResource::User(id)),
            ReviewStoreError::PullRequestNotFound(id) => {
                Self::NotFound(MissingResource::PullRequest(id))
            }
            ReviewStoreError::ReviewerNotAssigned {
                pull_request,
                reviewer,
            } => Self::NotAssigned {
                pull_request,
                reviewer,
            },
            other @ (ReviewStoreError::InvalidPersistedData(_)
            | ReviewStoreError::Persistence(_)) => Self::Persistence(other),
        }
    }
}
