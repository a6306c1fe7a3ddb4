//! Row sets backing the in-memory review store.

use crate::review::{
    domain::{
        PersistedPullRequestData, PullRequest, PullRequestId, PullRequestStatus, ReviewStats,
        ReviewerLoad, Team, TeamId, TeamName, User, UserId,
    },
    ports::{ReviewStoreError, ReviewStoreResult},
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

/// Pull request row without reviewer links.
#[derive(Debug, Clone)]
struct PullRequestRow {
    title: String,
    author_id: UserId,
    status: PullRequestStatus,
    created_at: DateTime<Utc>,
    merged_at: Option<DateTime<Utc>>,
}

/// Reviewer link row. `sequence` preserves assignment order.
#[derive(Debug, Clone)]
struct ReviewerLinkRow {
    sequence: u64,
    pull_request: PullRequestId,
    reviewer: UserId,
}

/// Complete committed or staged state of the store.
#[derive(Debug, Clone, Default)]
pub(super) struct ReviewState {
    last_team_id: i64,
    last_link_sequence: u64,
    teams: BTreeMap<TeamId, TeamName>,
    users: BTreeMap<UserId, User>,
    pull_requests: HashMap<PullRequestId, PullRequestRow>,
    reviewer_links: Vec<ReviewerLinkRow>,
}

impl ReviewState {
    pub(super) fn insert_team(&mut self, name: &TeamName) -> ReviewStoreResult<TeamId> {
        if self.teams.values().any(|existing| existing == name) {
            return Err(ReviewStoreError::DuplicateTeam(name.clone()));
        }
        self.last_team_id += 1;
        let team_id = TeamId::new(self.last_team_id);
        self.teams.insert(team_id, name.clone());
        Ok(team_id)
    }

    pub(super) fn team_name(&self, team_id: TeamId) -> Option<TeamName> {
        self.teams.get(&team_id).cloned()
    }

    pub(super) fn team_by_name(&self, name: &TeamName) -> Option<Team> {
        let (team_id, team_name) = self.teams.iter().find(|(_, existing)| *existing == name)?;
        let members = self
            .users
            .values()
            .filter(|user| user.team_id() == *team_id)
            .cloned()
            .collect();
        Some(Team::new(*team_id, team_name.clone(), members))
    }

    pub(super) fn user(&self, id: &UserId) -> Option<User> {
        self.users.get(id).cloned()
    }

    pub(super) fn active_member_ids(&self, team_id: TeamId, exclude: &UserId) -> Vec<UserId> {
        self.users
            .values()
            .filter(|user| user.team_id() == team_id && user.is_active() && user.id() != exclude)
            .map(|user| user.id().clone())
            .collect()
    }

    pub(super) fn insert_user(&mut self, user: &User) -> ReviewStoreResult<()> {
        if !self.teams.contains_key(&user.team_id()) {
            return Err(ReviewStoreError::TeamNotFound(user.team_id()));
        }
        if self.users.contains_key(user.id()) {
            return Err(ReviewStoreError::persistence(std::io::Error::other(format!(
                "user {} already exists",
                user.id()
            ))));
        }
        self.users.insert(user.id().clone(), user.clone());
        Ok(())
    }

    pub(super) fn update_user(&mut self, user: &User) -> ReviewStoreResult<()> {
        if !self.teams.contains_key(&user.team_id()) {
            return Err(ReviewStoreError::TeamNotFound(user.team_id()));
        }
        let existing = self
            .users
            .get_mut(user.id())
            .ok_or_else(|| ReviewStoreError::UserNotFound(user.id().clone()))?;
        *existing = user.clone();
        Ok(())
    }

    pub(super) fn insert_pull_request(&mut self, pull_request: &PullRequest) -> ReviewStoreResult<()> {
        if self.pull_requests.contains_key(pull_request.id()) {
            return Err(ReviewStoreError::DuplicatePullRequest(pull_request.id().clone()));
        }
        if !self.users.contains_key(pull_request.author_id()) {
            return Err(ReviewStoreError::UserNotFound(pull_request.author_id().clone()));
        }
        self.pull_requests.insert(
            pull_request.id().clone(),
            PullRequestRow {
                title: pull_request.title().to_owned(),
                author_id: pull_request.author_id().clone(),
                status: pull_request.status(),
                created_at: pull_request.created_at(),
                merged_at: pull_request.merged_at(),
            },
        );
        Ok(())
    }

    pub(super) fn update_pull_request(&mut self, pull_request: &PullRequest) -> ReviewStoreResult<()> {
        let row = self
            .pull_requests
            .get_mut(pull_request.id())
            .ok_or_else(|| ReviewStoreError::PullRequestNotFound(pull_request.id().clone()))?;
        row.status = pull_request.status();
        row.merged_at = pull_request.merged_at();
        Ok(())
    }

    pub(super) fn pull_request(&self, id: &PullRequestId) -> Option<PullRequest> {
        let row = self.pull_requests.get(id)?;
        Some(self.assemble(id, row))
    }

    pub(super) fn add_reviewer(
        &mut self,
        pull_request: &PullRequestId,
        reviewer: &UserId,
    ) -> ReviewStoreResult<()> {
        if !self.pull_requests.contains_key(pull_request) {
            return Err(ReviewStoreError::PullRequestNotFound(pull_request.clone()));
        }
        if !self.users.contains_key(reviewer) {
            return Err(ReviewStoreError::UserNotFound(reviewer.clone()));
        }
        let linked = self
            .reviewer_links
            .iter()
            .any(|link| link.pull_request == *pull_request && link.reviewer == *reviewer);
        if linked {
            return Ok(());
        }
        self.last_link_sequence += 1;
        self.reviewer_links.push(ReviewerLinkRow {
            sequence: self.last_link_sequence,
            pull_request: pull_request.clone(),
            reviewer: reviewer.clone(),
        });
        Ok(())
    }

    pub(super) fn remove_reviewer(
        &mut self,
        pull_request: &PullRequestId,
        reviewer: &UserId,
    ) -> ReviewStoreResult<()> {
        let before = self.reviewer_links.len();
        self.reviewer_links
            .retain(|link| !(link.pull_request == *pull_request && link.reviewer == *reviewer));
        if self.reviewer_links.len() == before {
            return Err(ReviewStoreError::ReviewerNotAssigned {
                pull_request: pull_request.clone(),
                reviewer: reviewer.clone(),
            });
        }
        Ok(())
    }

    pub(super) fn by_reviewer(&self, reviewer: &UserId) -> Vec<PullRequest> {
        let mut found: Vec<PullRequest> = self
            .reviewer_links
            .iter()
            .filter(|link| link.reviewer == *reviewer)
            .filter_map(|link| self.pull_request(&link.pull_request))
            .collect();
        found.sort_by(|left, right| {
            left.created_at()
                .cmp(&right.created_at())
                .then_with(|| left.id().cmp(right.id()))
        });
        found
    }

    pub(super) fn stats(&self) -> ReviewStats {
        let mut loads: BTreeMap<&UserId, u64> = BTreeMap::new();
        for link in &self.reviewer_links {
            *loads.entry(&link.reviewer).or_default() += 1;
        }
        let reviewers = loads
            .into_iter()
            .filter_map(|(user_id, review_count)| {
                self.users.get(user_id).map(|user| ReviewerLoad {
                    user_id: user_id.clone(),
                    username: user.name().to_owned(),
                    review_count,
                })
            })
            .collect();
        let count_status = |status: PullRequestStatus| {
            count(self.pull_requests.values().filter(|row| row.status == status))
        };
        let mut stats = ReviewStats {
            total_teams: count(self.teams.keys()),
            total_users: count(self.users.keys()),
            total_pull_requests: count(self.pull_requests.keys()),
            open_pull_requests: count_status(PullRequestStatus::Open),
            merged_pull_requests: count_status(PullRequestStatus::Merged),
            reviewers,
        };
        stats.sort_reviewers();
        stats
    }

    fn assemble(&self, id: &PullRequestId, row: &PullRequestRow) -> PullRequest {
        let mut links: Vec<&ReviewerLinkRow> = self
            .reviewer_links
            .iter()
            .filter(|link| link.pull_request == *id)
            .collect();
        links.sort_by_key(|link| link.sequence);
        PullRequest::from_persisted(PersistedPullRequestData {
            id: id.clone(),
            title: row.title.clone(),
            author_id: row.author_id.clone(),
            status: row.status,
            reviewers: links.into_iter().map(|link| link.reviewer.clone()).collect(),
            created_at: row.created_at,
            merged_at: row.merged_at,
        })
    }
}

fn count<I: Iterator>(items: I) -> u64 {
    u64::try_from(items.count()).unwrap_or(u64::MAX)
}
