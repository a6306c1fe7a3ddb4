//! Composition of every review service over one store.

use super::{
    PullRequestLifecycleService, ServiceSettings, StatsService, TeamMembershipService,
    UserActivationService,
};
use crate::review::ports::ReviewStore;
use mockable::Clock;
use std::sync::Arc;

/// All review services sharing one store, clock and settings.
///
/// This replaces process-wide singletons: build one engine at startup and
/// pass it (or clones of it) to whatever drives the operations.
#[derive(Clone)]
pub struct ReviewEngine<S, C>
where
    S: ReviewStore,
    C: Clock + Send + Sync,
{
    pull_requests: PullRequestLifecycleService<S, C>,
    teams: TeamMembershipService<S>,
    users: UserActivationService<S>,
    stats: StatsService<S>,
}

impl<S, C> ReviewEngine<S, C>
where
    S: ReviewStore,
    C: Clock + Send + Sync,
{
    /// Wires every service to `store` and `clock`.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<C>, settings: ServiceSettings) -> Self {
        Self {
            pull_requests: PullRequestLifecycleService::with_settings(
                Arc::clone(&store),
                clock,
                settings,
            ),
            teams: TeamMembershipService::with_settings(Arc::clone(&store), settings),
            users: UserActivationService::with_settings(Arc::clone(&store), settings),
            stats: StatsService::with_settings(store, settings),
        }
    }

    /// Pull request lifecycle operations.
    #[must_use]
    pub const fn pull_requests(&self) -> &PullRequestLifecycleService<S, C> {
        &self.pull_requests
    }

    /// Team roster operations.
    #[must_use]
    pub const fn teams(&self) -> &TeamMembershipService<S> {
        &self.teams
    }

    /// User activation operations.
    #[must_use]
    pub const fn users(&self) -> &UserActivationService<S> {
        &self.users
    }

    /// Statistics.
    #[must_use]
    pub const fn stats(&self) -> &StatsService<S> {
        &self.stats
    }
}
