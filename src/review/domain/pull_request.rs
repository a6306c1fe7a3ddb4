//! Pull request aggregate root and its lifecycle state machine.

use super::{ParsePullRequestStatusError, PullRequestId, ReviewDomainError, UserId, ids::non_blank};
use chrono::{DateTime, SubsecRound, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Maximum number of reviewers concurrently assigned to one pull request.
pub const MAX_REVIEWERS: usize = 2;

/// Pull request lifecycle state.
///
/// `Open` is the initial state and `Merged` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PullRequestStatus {
    /// Under review; reviewers may still be swapped.
    Open,
    /// Merged; no further reviewer changes are permitted.
    Merged,
}

impl PullRequestStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Merged => "MERGED",
        }
    }

    /// Returns whether no transition leaves this state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Merged)
    }
}

impl TryFrom<&str> for PullRequestStatus {
    type Error = ParsePullRequestStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "OPEN" => Ok(Self::Open),
            "MERGED" => Ok(Self::Merged),
            _ => Err(ParsePullRequestStatusError(value.to_owned())),
        }
    }
}

/// Pull request aggregate root.
///
/// Holds at most [`MAX_REVIEWERS`] distinct reviewers, none of whom is the
/// author. `merged_at` is set exactly when the status is
/// [`PullRequestStatus::Merged`] and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    id: PullRequestId,
    title: String,
    author_id: UserId,
    status: PullRequestStatus,
    reviewers: Vec<UserId>,
    created_at: DateTime<Utc>,
    merged_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedPullRequestData {
    /// Persisted identifier.
    pub id: PullRequestId,
    /// Persisted title.
    pub title: String,
    /// Persisted author.
    pub author_id: UserId,
    /// Persisted lifecycle state.
    pub status: PullRequestStatus,
    /// Persisted reviewer links in assignment order.
    pub reviewers: Vec<UserId>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted merge timestamp, if merged.
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    /// Opens a new pull request with its initial reviewer set.
    ///
    /// # Errors
    ///
    /// Returns a [`ReviewDomainError`] when the title is blank or the
    /// reviewer set breaks the reviewer invariants.
    pub fn open(
        id: PullRequestId,
        title: impl Into<String>,
        author_id: UserId,
        reviewers: Vec<UserId>,
        clock: &impl Clock,
    ) -> Result<Self, ReviewDomainError> {
        let title = non_blank(title.into(), ReviewDomainError::EmptyTitle)?;
        check_reviewers(&id, &author_id, &reviewers)?;
        Ok(Self {
            id,
            title,
            author_id,
            status: PullRequestStatus::Open,
            reviewers,
            created_at: now(clock),
            merged_at: None,
        })
    }

    /// Reconstructs a pull request from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedPullRequestData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            author_id: data.author_id,
            status: data.status,
            reviewers: data.reviewers,
            created_at: data.created_at,
            merged_at: data.merged_at,
        }
    }

    /// Returns the pull request identifier.
    #[must_use]
    pub const fn id(&self) -> &PullRequestId {
        &self.id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the author.
    #[must_use]
    pub const fn author_id(&self) -> &UserId {
        &self.author_id
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn status(&self) -> PullRequestStatus {
        self.status
    }

    /// Returns the assigned reviewers in assignment order.
    #[must_use]
    pub fn reviewers(&self) -> &[UserId] {
        &self.reviewers
    }

    /// Returns whether `user_id` currently reviews this pull request.
    #[must_use]
    pub fn is_reviewer(&self, user_id: &UserId) -> bool {
        self.reviewers.contains(user_id)
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the merge timestamp, if merged.
    #[must_use]
    pub const fn merged_at(&self) -> Option<DateTime<Utc>> {
        self.merged_at
    }

    /// Marks the pull request as merged.
    ///
    /// Returns `false` without touching the timestamp when the pull request
    /// was already merged.
    pub fn merge(&mut self, clock: &impl Clock) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = PullRequestStatus::Merged;
        self.merged_at = Some(now(clock));
        true
    }

    /// Removes `old` from the reviewers and appends `new`.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewDomainError::ReviewerNotAssigned`] when `old` is not a
    /// reviewer, [`ReviewDomainError::PullRequestMerged`] when the pull
    /// request is terminal, and the invariant errors when `new` is the author
    /// or already a reviewer.
    pub fn replace_reviewer(&mut self, old: &UserId, new: UserId) -> Result<(), ReviewDomainError> {
        let Some(position) = self.reviewers.iter().position(|id| id == old) else {
            return Err(ReviewDomainError::ReviewerNotAssigned {
                pull_request: self.id.clone(),
                reviewer: old.clone(),
            });
        };
        if self.status.is_terminal() {
            return Err(ReviewDomainError::PullRequestMerged(self.id.clone()));
        }
        if new == self.author_id {
            return Err(ReviewDomainError::AuthorAsReviewer {
                pull_request: self.id.clone(),
                author: new,
            });
        }
        if self.reviewers.contains(&new) {
            return Err(ReviewDomainError::DuplicateReviewer {
                pull_request: self.id.clone(),
                reviewer: new,
            });
        }
        self.reviewers.remove(position);
        self.reviewers.push(new);
        Ok(())
    }
}

/// Reads the clock at the microsecond precision storage keeps.
fn now(clock: &impl Clock) -> DateTime<Utc> {
    clock.utc().trunc_subsecs(6)
}

fn check_reviewers(
    id: &PullRequestId,
    author_id: &UserId,
    reviewers: &[UserId],
) -> Result<(), ReviewDomainError> {
    if reviewers.len() > MAX_REVIEWERS {
        return Err(ReviewDomainError::TooManyReviewers {
            pull_request: id.clone(),
            count: reviewers.len(),
            limit: MAX_REVIEWERS,
        });
    }
    for (index, reviewer) in reviewers.iter().enumerate() {
        if reviewer == author_id {
            return Err(ReviewDomainError::AuthorAsReviewer {
                pull_request: id.clone(),
                author: reviewer.clone(),
            });
        }
        if reviewers.iter().take(index).any(|earlier| earlier == reviewer) {
            return Err(ReviewDomainError::DuplicateReviewer {
                pull_request: id.clone(),
                reviewer: reviewer.clone(),
            });
        }
    }
    Ok(())
}
