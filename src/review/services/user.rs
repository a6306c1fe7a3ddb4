//! User activation and reviewer workload lookups.

use super::{
    MissingResource, ReviewError, ReviewResult, ServiceSettings, deadline::within_deadline,
    unit_of_work::finish,
};
use crate::review::{
    domain::{PullRequest, UserId, UserProfile},
    ports::{ReviewStore, ReviewTransaction},
};
use std::sync::Arc;
use tracing::info;

/// Toggles reviewer eligibility and lists assignments.
#[derive(Clone)]
pub struct UserActivationService<S>
where
    S: ReviewStore,
{
    store: Arc<S>,
    settings: ServiceSettings,
}

impl<S> UserActivationService<S>
where
    S: ReviewStore,
{
    /// Creates a user service with default settings.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self::with_settings(store, ServiceSettings::default())
    }

    /// Creates a user service with explicit settings.
    #[must_use]
    pub const fn with_settings(store: Arc<S>, settings: ServiceSettings) -> Self {
        Self { store, settings }
    }

    /// Sets whether `user_id` may be selected as a reviewer.
    ///
    /// Existing reviewer assignments are left in place.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::NotFound`] when the user does not exist.
    pub async fn set_active(
        &self,
        user_id: &UserId,
        is_active: bool,
    ) -> ReviewResult<UserProfile> {
        within_deadline(self.settings, "set_active", async {
            let mut transaction = self.store.begin().await?;
            let outcome = toggle(&mut transaction, user_id, is_active).await;
            let profile = finish(transaction, "set_active", outcome).await?;
            info!(
                user = %user_id,
                is_active,
                team = %profile.team_name,
                "user activation changed"
            );
            Ok(profile)
        })
        .await
    }

    /// Lists pull requests, open or merged, that `user_id` reviews.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::NotFound`] when the user does not exist.
    pub async fn assigned_pull_requests(
        &self,
        user_id: &UserId,
    ) -> ReviewResult<Vec<PullRequest>> {
        within_deadline(self.settings, "assigned_pull_requests", async {
            if self.store.find_user(user_id).await?.is_none() {
                return Err(ReviewError::NotFound(MissingResource::User(user_id.clone())));
            }
            Ok(self.store.list_by_reviewer(user_id).await?)
        })
        .await
    }
}

async fn toggle<Tx>(
    transaction: &mut Tx,
    user_id: &UserId,
    is_active: bool,
) -> ReviewResult<UserProfile>
where
    Tx: ReviewTransaction,
{
    let mut user = transaction
        .find_user(user_id)
        .await?
        .ok_or_else(|| ReviewError::NotFound(MissingResource::User(user_id.clone())))?;
    user.set_active(is_active);
    transaction.update_user(&user).await?;
    let team_name = transaction
        .find_team_name(user.team_id())
        .await?
        .ok_or_else(|| ReviewError::NotFound(MissingResource::TeamId(user.team_id())))?;
    Ok(UserProfile { user, team_name })
}
