//! Team member records.

use super::{ReviewDomainError, TeamId, TeamName, UserId, ids::non_blank};
use serde::{Deserialize, Serialize};

/// A team member who can author or review pull requests.
///
/// Only active users are offered as reviewer candidates. Toggling the flag
/// never touches reviewer assignments that already exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    name: String,
    team_id: TeamId,
    is_active: bool,
}

impl User {
    /// Creates a user record owned by `team_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewDomainError::EmptyUserName`] when the display name is
    /// blank.
    pub fn new(
        id: UserId,
        name: impl Into<String>,
        team_id: TeamId,
        is_active: bool,
    ) -> Result<Self, ReviewDomainError> {
        let name = non_blank(name.into(), ReviewDomainError::EmptyUserName(id.clone()))?;
        Ok(Self {
            id,
            name,
            team_id,
            is_active,
        })
    }

    /// Builds a user from parts that were already validated.
    pub(super) const fn from_validated(
        id: UserId,
        name: String,
        team_id: TeamId,
        is_active: bool,
    ) -> Self {
        Self {
            id,
            name,
            team_id,
            is_active,
        }
    }

    /// Returns the user identifier.
    #[must_use]
    pub const fn id(&self) -> &UserId {
        &self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the owning team.
    #[must_use]
    pub const fn team_id(&self) -> TeamId {
        self.team_id
    }

    /// Returns whether the user may be picked as a reviewer.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.is_active
    }

    /// Sets the active flag.
    pub const fn set_active(&mut self, is_active: bool) {
        self.is_active = is_active;
    }

    /// Overwrites roster-controlled attributes and moves the user to `team_id`.
    pub fn resync(&mut self, name: String, is_active: bool, team_id: TeamId) {
        self.name = name;
        self.is_active = is_active;
        self.team_id = team_id;
    }
}

/// A user together with the name of the team that owns them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// The user record.
    pub user: User,
    /// Name of the owning team.
    pub team_name: TeamName,
}
