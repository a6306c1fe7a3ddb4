//! Diesel row models for reviewer assignment persistence.

use super::schema::{pr_reviewers, pull_requests, teams, users};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Insert model for team records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = teams)]
pub struct NewTeamRow {
    /// Unique team name.
    pub name: String,
}

/// Query result and insert model for user records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    /// User identifier.
    pub id: String,
    /// Display name.
    pub username: String,
    /// Active flag.
    pub is_active: bool,
    /// Owning team.
    pub team_id: i64,
}

/// Query result row for pull request records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = pull_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PullRequestRow {
    /// Pull request identifier.
    pub id: String,
    /// Title.
    pub title: String,
    /// Authoring user.
    pub author_id: String,
    /// Lifecycle state.
    pub status: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Merge timestamp.
    pub merged_at: Option<DateTime<Utc>>,
}

/// Insert model for pull request records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = pull_requests)]
pub struct NewPullRequestRow {
    /// Pull request identifier.
    pub id: String,
    /// Title.
    pub title: String,
    /// Authoring user.
    pub author_id: String,
    /// Lifecycle state.
    pub status: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Merge timestamp.
    pub merged_at: Option<DateTime<Utc>>,
}

/// Insert model for reviewer links.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = pr_reviewers)]
pub struct NewReviewerLinkRow {
    /// Linked pull request.
    pub pr_id: String,
    /// Linked reviewer.
    pub user_id: String,
}
