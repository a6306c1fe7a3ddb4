//! Application services for reviewer assignment and pull request lifecycle.
//!
//! Each service owns an [`Arc`](std::sync::Arc) to the persistence gateway and
//! runs every public operation under the configured deadline. Writes happen
//! inside one [`ReviewTransaction`](crate::review::ports::ReviewTransaction);
//! any failure abandons it, which rolls back every staged change.

mod deadline;
mod engine;
mod error;
mod pull_request;
mod selector;
mod stats;
mod team;
mod unit_of_work;
mod user;

pub use deadline::ServiceSettings;
pub use engine::ReviewEngine;
pub use error::{MissingResource, ReviewError, ReviewResult};
pub use pull_request::{CreatePullRequestRequest, PullRequestLifecycleService, Reassignment};
pub use selector::{ReviewerSelector, sample_without_replacement};
pub use stats::StatsService;
pub use team::{CreateTeamRequest, TeamMembershipService};
pub use user::UserActivationService;
