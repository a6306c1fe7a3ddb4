//! In-memory integration tests for the pull request lifecycle.

use super::helpers::{
    TestEngine, create_team, engine, ensure_reviewer_invariants, open_pull_request, pr_id,
    user_id,
};
use reviewer_assigner::review::{domain::PullRequestStatus, services::ReviewError};
use rstest::rstest;
use std::sync::Arc;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn open_merge_and_list_by_reviewer(engine: Arc<TestEngine>) -> Result<(), eyre::Report> {
    create_team(&engine, "backend", &["u1", "u2"]).await?;
    let opened = open_pull_request(&engine, "pr-1", "u1").await?;
    eyre::ensure!(opened.reviewers() == [user_id("u2")?], "u2 should review");

    let merged = engine.pull_requests().merge(&pr_id("pr-1")?).await?;
    eyre::ensure!(merged.status() == PullRequestStatus::Merged, "status should be merged");

    let assigned = engine
        .users()
        .assigned_pull_requests(&user_id("u2")?)
        .await?;
    eyre::ensure!(assigned == vec![merged], "merged pull requests stay listed");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn repeated_reassignment_cycles_through_the_team(
    engine: Arc<TestEngine>,
) -> Result<(), eyre::Report> {
    create_team(&engine, "backend", &["u1", "u2", "u3", "u4", "u5"]).await?;
    let mut current = open_pull_request(&engine, "pr-1", "u1").await?;

    for _ in 0..6 {
        let Some(old) = current.reviewers().first().cloned() else {
            eyre::bail!("pull request lost its reviewers");
        };
        let reassignment = engine
            .pull_requests()
            .reassign(&pr_id("pr-1")?, &old)
            .await?;
        eyre::ensure!(reassignment.new_reviewer != old, "replacement must differ");
        eyre::ensure!(
            !current.is_reviewer(&reassignment.new_reviewer),
            "replacement must not already review"
        );
        current = reassignment.pull_request;
        ensure_reviewer_invariants(&current)?;
        eyre::ensure!(current.reviewers().len() == 2, "reviewer count must hold");
    }
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reassigning_on_unknown_pull_request_is_not_found(
    engine: Arc<TestEngine>,
) -> Result<(), eyre::Report> {
    let result = engine
        .pull_requests()
        .reassign(&pr_id("missing")?, &user_id("u1")?)
        .await;
    eyre::ensure!(
        matches!(result, Err(ref err) if err.is_not_found()),
        "expected NotFound, got {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn author_from_another_team_draws_from_their_own_team(
    engine: Arc<TestEngine>,
) -> Result<(), eyre::Report> {
    create_team(&engine, "backend", &["b1", "b2", "b3"]).await?;
    create_team(&engine, "frontend", &["f1", "f2"]).await?;

    let opened = open_pull_request(&engine, "pr-1", "f1").await?;

    eyre::ensure!(opened.reviewers() == [user_id("f2")?], "only f2 is eligible");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_pull_request_id_is_rejected(engine: Arc<TestEngine>) -> Result<(), eyre::Report> {
    create_team(&engine, "backend", &["u1", "u2"]).await?;
    open_pull_request(&engine, "pr-1", "u1").await?;

    let result = open_pull_request(&engine, "pr-1", "u2").await;
    let err = result.err().ok_or_else(|| eyre::eyre!("duplicate should fail"))?;
    eyre::ensure!(
        matches!(
            err.downcast_ref::<ReviewError>(),
            Some(ReviewError::PullRequestExists(_))
        ),
        "expected PullRequestExists, got {err:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stats_reflect_lifecycle(engine: Arc<TestEngine>) -> Result<(), eyre::Report> {
    create_team(&engine, "backend", &["u1", "u2", "u3"]).await?;
    create_team(&engine, "frontend", &["f1"]).await?;
    open_pull_request(&engine, "pr-1", "u1").await?;
    open_pull_request(&engine, "pr-2", "f1").await?;
    engine.pull_requests().merge(&pr_id("pr-2")?).await?;

    let stats = engine.stats().stats().await?;

    eyre::ensure!(stats.total_teams == 2, "two teams");
    eyre::ensure!(stats.total_users == 4, "four users");
    eyre::ensure!(stats.total_pull_requests == 2, "two pull requests");
    eyre::ensure!(stats.open_pull_requests == 1, "one open");
    eyre::ensure!(stats.merged_pull_requests == 1, "one merged");
    let reviewers: Vec<&str> = stats
        .reviewers
        .iter()
        .map(|load| load.user_id.as_str())
        .collect();
    eyre::ensure!(reviewers == ["u2", "u3"], "got {reviewers:?}");
    Ok(())
}
