//! Pull request creation, merge and reviewer reassignment.

use super::{
    MissingResource, ReviewError, ReviewResult, ReviewerSelector, ServiceSettings,
    deadline::within_deadline, unit_of_work::finish,
};
use crate::review::{
    domain::{MAX_REVIEWERS, PullRequest, PullRequestId, ReviewDomainError, UserId},
    ports::{ReviewStore, ReviewTransaction},
};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Request payload for opening a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePullRequestRequest {
    id: String,
    title: String,
    author_id: String,
}

impl CreatePullRequestRequest {
    /// Creates a request with the caller-chosen identifier, title and author.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        author_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author_id: author_id.into(),
        }
    }
}

/// Outcome of a successful reviewer swap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reassignment {
    /// The pull request after the swap.
    pub pull_request: PullRequest,
    /// The reviewer that replaced the old one.
    pub new_reviewer: UserId,
}

/// Pull request lifecycle orchestration service.
#[derive(Clone)]
pub struct PullRequestLifecycleService<S, C>
where
    S: ReviewStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
    selector: ReviewerSelector<S>,
    settings: ServiceSettings,
}

impl<S, C> PullRequestLifecycleService<S, C>
where
    S: ReviewStore,
    C: Clock + Send + Sync,
{
    /// Creates a lifecycle service with default settings.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self::with_settings(store, clock, ServiceSettings::default())
    }

    /// Creates a lifecycle service with explicit settings.
    #[must_use]
    pub fn with_settings(store: Arc<S>, clock: Arc<C>, settings: ServiceSettings) -> Self {
        let selector = ReviewerSelector::new(Arc::clone(&store));
        Self {
            store,
            clock,
            selector,
            settings,
        }
    }

    /// Opens a pull request and assigns up to two reviewers from the
    /// author's team.
    ///
    /// Fewer reviewers are assigned when the team has fewer active members
    /// besides the author. Zero reviewers is a valid outcome.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::NotFound`] when the author does not exist,
    /// [`ReviewError::PullRequestExists`] when the identifier is taken and
    /// [`ReviewError::Domain`] when input validation fails. Nothing is
    /// persisted on error.
    pub async fn create_and_assign(
        &self,
        request: CreatePullRequestRequest,
    ) -> ReviewResult<PullRequest> {
        within_deadline(self.settings, "create_and_assign", async move {
            let id = PullRequestId::new(request.id)?;
            let author_id = UserId::new(request.author_id)?;
            let reviewers = self
                .selector
                .select_reviewers(&author_id, &[], MAX_REVIEWERS)
                .await?;
            let pull_request =
                PullRequest::open(id, request.title, author_id, reviewers, &*self.clock)?;

            let mut transaction = self.store.begin().await?;
            let outcome = insert_with_reviewers(&mut transaction, &pull_request).await;
            finish(transaction, "create_and_assign", outcome).await?;

            info!(
                pull_request = %pull_request.id(),
                author = %pull_request.author_id(),
                reviewers = pull_request.reviewers().len(),
                "pull request opened"
            );
            Ok(pull_request)
        })
        .await
    }

    /// Marks a pull request as merged.
    ///
    /// Merging an already merged pull request returns it unchanged,
    /// including the original merge timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::NotFound`] when the pull request does not
    /// exist.
    pub async fn merge(&self, id: &PullRequestId) -> ReviewResult<PullRequest> {
        within_deadline(self.settings, "merge", async {
            let mut transaction = self.store.begin().await?;
            let outcome = self.merge_locked(&mut transaction, id).await;
            finish(transaction, "merge", outcome).await
        })
        .await
    }

    /// Replaces `old_reviewer` with another active member of the author's
    /// team.
    ///
    /// The replacement is never the author or a current reviewer. The old
    /// reviewer is removed and the new one appended, so the reviewer count
    /// is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::NotFound`] when the pull request does not
    /// exist, [`ReviewError::NotAssigned`] when `old_reviewer` does not
    /// review it, [`ReviewError::PullRequestMerged`] when it is merged and
    /// [`ReviewError::NoCandidate`] when nobody can take over. State is
    /// unchanged on error.
    pub async fn reassign(
        &self,
        id: &PullRequestId,
        old_reviewer: &UserId,
    ) -> ReviewResult<Reassignment> {
        within_deadline(self.settings, "reassign", async {
            let snapshot = self.require(id).await?;
            ensure_reassignable(&snapshot, old_reviewer)?;

            let candidates = self
                .selector
                .select_reviewers(snapshot.author_id(), snapshot.reviewers(), 1)
                .await?;
            let Some(new_reviewer) = candidates.into_iter().next() else {
                return Err(ReviewError::NoCandidate(id.clone()));
            };

            let mut transaction = self.store.begin().await?;
            let outcome =
                swap_reviewer(&mut transaction, id, old_reviewer, new_reviewer).await;
            let reassignment = finish(transaction, "reassign", outcome).await?;

            info!(
                pull_request = %id,
                old_reviewer = %old_reviewer,
                new_reviewer = %reassignment.new_reviewer,
                "reviewer reassigned"
            );
            Ok(reassignment)
        })
        .await
    }

    /// Retrieves a pull request with its reviewers.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::NotFound`] when the pull request does not
    /// exist.
    pub async fn find(&self, id: &PullRequestId) -> ReviewResult<PullRequest> {
        within_deadline(self.settings, "find_pull_request", self.require(id)).await
    }

    async fn require(&self, id: &PullRequestId) -> ReviewResult<PullRequest> {
        self.store
            .find_pull_request(id)
            .await?
            .ok_or_else(|| ReviewError::NotFound(MissingResource::PullRequest(id.clone())))
    }

    async fn merge_locked(
        &self,
        transaction: &mut S::Transaction,
        id: &PullRequestId,
    ) -> ReviewResult<PullRequest> {
        let mut pull_request = lock(transaction, id).await?;
        if pull_request.merge(&*self.clock) {
            transaction.update_pull_request(&pull_request).await?;
            info!(pull_request = %id, "pull request merged");
        } else {
            debug!(pull_request = %id, "pull request already merged");
        }
        Ok(pull_request)
    }
}

async fn lock<Tx>(transaction: &mut Tx, id: &PullRequestId) -> ReviewResult<PullRequest>
where
    Tx: ReviewTransaction,
{
    transaction
        .lock_pull_request(id)
        .await?
        .ok_or_else(|| ReviewError::NotFound(MissingResource::PullRequest(id.clone())))
}

fn ensure_reassignable(pull_request: &PullRequest, old_reviewer: &UserId) -> ReviewResult<()> {
    if !pull_request.is_reviewer(old_reviewer) {
        return Err(ReviewError::NotAssigned {
            pull_request: pull_request.id().clone(),
            reviewer: old_reviewer.clone(),
        });
    }
    if pull_request.status().is_terminal() {
        return Err(ReviewError::PullRequestMerged(pull_request.id().clone()));
    }
    Ok(())
}

async fn insert_with_reviewers<Tx>(
    transaction: &mut Tx,
    pull_request: &PullRequest,
) -> ReviewResult<()>
where
    Tx: ReviewTransaction,
{
    transaction.insert_pull_request(pull_request).await?;
    for reviewer in pull_request.reviewers() {
        transaction.add_reviewer(pull_request.id(), reviewer).await?;
    }
    Ok(())
}

/// Re-checks the pull request under its lock before swapping links.
///
/// Another caller may have merged it or changed its reviewers since the
/// unlocked read that chose `new_reviewer`.
async fn swap_reviewer<Tx>(
    transaction: &mut Tx,
    id: &PullRequestId,
    old_reviewer: &UserId,
    new_reviewer: UserId,
) -> ReviewResult<Reassignment>
where
    Tx: ReviewTransaction,
{
    let mut pull_request = lock(transaction, id).await?;
    pull_request
        .replace_reviewer(old_reviewer, new_reviewer.clone())
        .map_err(|err| match err {
            ReviewDomainError::DuplicateReviewer { .. } => ReviewError::NoCandidate(id.clone()),
            other => other.into(),
        })?;
    transaction.remove_reviewer(id, old_reviewer).await?;
    transaction.add_reviewer(id, &new_reviewer).await?;
    Ok(Reassignment {
        pull_request,
        new_reviewer,
    })
}
