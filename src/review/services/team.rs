//! Team creation with roster synchronization.

use super::{
    MissingResource, ReviewError, ReviewResult, ServiceSettings, deadline::within_deadline,
    unit_of_work::finish,
};
use crate::review::{
    domain::{Team, TeamMember, TeamName, User},
    ports::{ReviewStore, ReviewTransaction},
};
use std::sync::Arc;
use tracing::{debug, info};

/// Request payload for creating a team from a roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTeamRequest {
    name: String,
    members: Vec<TeamMember>,
}

impl CreateTeamRequest {
    /// Creates a request for a team with no members.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Appends one roster entry.
    #[must_use]
    pub fn with_member(mut self, member: TeamMember) -> Self {
        self.members.push(member);
        self
    }

    /// Appends roster entries.
    #[must_use]
    pub fn with_members(mut self, members: impl IntoIterator<Item = TeamMember>) -> Self {
        self.members.extend(members);
        self
    }
}

/// Team membership synchronization service.
#[derive(Clone)]
pub struct TeamMembershipService<S>
where
    S: ReviewStore,
{
    store: Arc<S>,
    settings: ServiceSettings,
}

impl<S> TeamMembershipService<S>
where
    S: ReviewStore,
{
    /// Creates a team service with default settings.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self::with_settings(store, ServiceSettings::default())
    }

    /// Creates a team service with explicit settings.
    #[must_use]
    pub const fn with_settings(store: Arc<S>, settings: ServiceSettings) -> Self {
        Self { store, settings }
    }

    /// Creates a team and upserts every roster member into it.
    ///
    /// Members that already exist elsewhere are moved into the new team and
    /// take the submitted name and active flag. When the roster repeats a
    /// user, the last entry wins.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::TeamExists`] when the name is taken, leaving the
    /// existing team untouched, and [`ReviewError::Domain`] for a blank name.
    /// A failure on any member aborts the whole creation.
    pub async fn create_team(&self, request: CreateTeamRequest) -> ReviewResult<Team> {
        within_deadline(self.settings, "create_team", async move {
            let name = TeamName::new(request.name)?;
            let roster = dedupe_roster(request.members);

            let mut transaction = self.store.begin().await?;
            let outcome = sync_roster(&mut transaction, name, &roster).await;
            let team = finish(transaction, "create_team", outcome).await?;

            info!(
                team = %team.name(),
                team_id = team.id().value(),
                members = team.members().len(),
                "team created"
            );
            Ok(team)
        })
        .await
    }

    /// Retrieves a team with its current members.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::NotFound`] when no team has that name.
    pub async fn get_team(&self, name: &TeamName) -> ReviewResult<Team> {
        within_deadline(self.settings, "get_team", async {
            self.store
                .find_team_by_name(name)
                .await?
                .ok_or_else(|| ReviewError::NotFound(MissingResource::Team(name.clone())))
        })
        .await
    }
}

fn dedupe_roster(members: Vec<TeamMember>) -> Vec<TeamMember> {
    let mut roster: Vec<TeamMember> = Vec::with_capacity(members.len());
    for member in members {
        roster.retain(|existing| existing.user_id() != member.user_id());
        roster.push(member);
    }
    roster
}

async fn sync_roster<Tx>(
    transaction: &mut Tx,
    name: TeamName,
    roster: &[TeamMember],
) -> ReviewResult<Team>
where
    Tx: ReviewTransaction,
{
    let team_id = transaction.insert_team(&name).await?;
    let mut members: Vec<User> = Vec::with_capacity(roster.len());
    for member in roster {
        let user = match transaction.find_user(member.user_id()).await? {
            Some(mut existing) => {
                debug!(
                    user = %member.user_id(),
                    from_team = existing.team_id().value(),
                    "moving existing user"
                );
                existing.resync(member.name().to_owned(), member.is_active(), team_id);
                transaction.update_user(&existing).await?;
                existing
            }
            None => {
                let created = member.to_user(team_id);
                transaction.insert_user(&created).await?;
                created
            }
        };
        members.push(user);
    }
    Ok(Team::new(team_id, name, members))
}
