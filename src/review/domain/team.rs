//! Team aggregate and roster entries.

use super::{ReviewDomainError, TeamId, TeamName, User, UserId, ids::non_blank};
use serde::{Deserialize, Serialize};

/// One entry of a submitted team roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    user_id: UserId,
    name: String,
    is_active: bool,
}

impl TeamMember {
    /// Creates a validated roster entry.
    ///
    /// # Errors
    ///
    /// Returns a [`ReviewDomainError`] when the identifier or name is blank.
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        is_active: bool,
    ) -> Result<Self, ReviewDomainError> {
        let user_id = UserId::new(user_id)?;
        let name = non_blank(name.into(), ReviewDomainError::EmptyUserName(user_id.clone()))?;
        Ok(Self {
            user_id,
            name,
            is_active,
        })
    }

    /// Returns the member's user identifier.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns the member's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the submitted active flag.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.is_active
    }

    /// Builds the user record this entry describes inside `team_id`.
    #[must_use]
    pub fn to_user(&self, team_id: TeamId) -> User {
        User::from_validated(self.user_id.clone(), self.name.clone(), team_id, self.is_active)
    }
}

/// A development team with its current members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    id: TeamId,
    name: TeamName,
    members: Vec<User>,
}

impl Team {
    /// Creates a team view. Members are ordered by user identifier.
    #[must_use]
    pub fn new(id: TeamId, name: TeamName, mut members: Vec<User>) -> Self {
        members.sort_by(|left, right| left.id().cmp(right.id()));
        Self { id, name, members }
    }

    /// Returns the team identifier.
    #[must_use]
    pub const fn id(&self) -> TeamId {
        self.id
    }

    /// Returns the team name.
    #[must_use]
    pub const fn name(&self) -> &TeamName {
        &self.name
    }

    /// Returns the team members.
    #[must_use]
    pub fn members(&self) -> &[User] {
        &self.members
    }
}
