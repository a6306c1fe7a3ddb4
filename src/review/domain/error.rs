//! Error types for review domain validation and parsing.

use super::{PullRequestId, UserId};
use thiserror::Error;

/// Errors returned while constructing or mutating review domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReviewDomainError {
    /// The user identifier is empty after trimming.
    #[error("user identifier must not be empty")]
    EmptyUserId,

    /// The pull request identifier is empty after trimming.
    #[error("pull request identifier must not be empty")]
    EmptyPullRequestId,

    /// The team name is empty after trimming.
    #[error("team name must not be empty")]
    EmptyTeamName,

    /// The user display name is empty after trimming.
    #[error("user name must not be empty for user {0}")]
    EmptyUserName(UserId),

    /// The pull request title is empty after trimming.
    #[error("pull request title must not be empty")]
    EmptyTitle,

    /// More reviewers were supplied than a pull request may hold.
    #[error("pull request {pull_request} cannot hold {count} reviewers, limit is {limit}")]
    TooManyReviewers {
        /// Pull request being built.
        pull_request: PullRequestId,
        /// Number of reviewers supplied.
        count: usize,
        /// Maximum reviewers allowed.
        limit: usize,
    },

    /// The author was supplied as a reviewer of their own pull request.
    #[error("author {author} cannot review pull request {pull_request}")]
    AuthorAsReviewer {
        /// Pull request being built.
        pull_request: PullRequestId,
        /// Offending author identifier.
        author: UserId,
    },

    /// The same reviewer appears twice on one pull request.
    #[error("reviewer {reviewer} is already assigned to pull request {pull_request}")]
    DuplicateReviewer {
        /// Pull request being built.
        pull_request: PullRequestId,
        /// Repeated reviewer identifier.
        reviewer: UserId,
    },

    /// The reviewer is not currently assigned to the pull request.
    #[error("reviewer {reviewer} is not assigned to pull request {pull_request}")]
    ReviewerNotAssigned {
        /// Pull request being modified.
        pull_request: PullRequestId,
        /// Reviewer that was expected.
        reviewer: UserId,
    },

    /// The pull request is merged and can no longer change reviewers.
    #[error("pull request {0} is merged")]
    PullRequestMerged(PullRequestId),
}

/// Error returned while parsing pull request statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown pull request status: {0}")]
pub struct ParsePullRequestStatusError(pub String);
