//! Read-only review statistics.

use super::UserId;
use serde::{Deserialize, Serialize};

/// Number of reviewer assignments held by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewerLoad {
    /// Reviewer identifier.
    pub user_id: UserId,
    /// Reviewer display name.
    pub username: String,
    /// Pull requests (open or merged) the user reviews.
    pub review_count: u64,
}

/// Aggregate counters over teams, users and pull requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewStats {
    /// Number of teams.
    pub total_teams: u64,
    /// Number of users.
    pub total_users: u64,
    /// Number of pull requests.
    pub total_pull_requests: u64,
    /// Number of open pull requests.
    pub open_pull_requests: u64,
    /// Number of merged pull requests.
    pub merged_pull_requests: u64,
    /// Users with at least one assignment, busiest first.
    pub reviewers: Vec<ReviewerLoad>,
}

impl ReviewStats {
    /// Orders reviewer loads by count descending, then by user identifier.
    pub fn sort_reviewers(&mut self) {
        self.reviewers.sort_by(|left, right| {
            right
                .review_count
                .cmp(&left.review_count)
                .then_with(|| left.user_id.cmp(&right.user_id))
        });
    }
}
