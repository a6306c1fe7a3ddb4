//! Domain model for reviewer assignment.
//!
//! Teams, users and pull requests are plain values here. Every invariant that
//! can be checked without persistence (reviewer limits, author exclusion,
//! terminal merge state) is enforced by the types in this module.

mod error;
mod ids;
mod pull_request;
mod stats;
mod team;
mod user;

pub use error::{ParsePullRequestStatusError, ReviewDomainError};
pub use ids::{PullRequestId, TeamId, TeamName, UserId};
pub use pull_request::{
    MAX_REVIEWERS, PersistedPullRequestData, PullRequest, PullRequestStatus,
};
pub use stats::{ReviewStats, ReviewerLoad};
pub use team::{Team, TeamMember};
pub use user::{User, UserProfile};
