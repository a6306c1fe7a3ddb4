//! In-memory integration tests for roster synchronization and activation.

use super::helpers::{TestEngine, create_team, engine, open_pull_request, pr_id, user_id};
use reviewer_assigner::review::{
    domain::{TeamMember, TeamName},
    services::{CreateTeamRequest, ReviewError},
};
use rstest::rstest;
use std::sync::Arc;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn moved_member_reviews_for_the_new_team(engine: Arc<TestEngine>) -> Result<(), eyre::Report> {
    create_team(&engine, "backend", &["u1", "u2"]).await?;
    create_team(&engine, "platform", &["p1", "u2"]).await?;

    let backend_pr = open_pull_request(&engine, "pr-1", "u1").await?;
    let platform_pr = open_pull_request(&engine, "pr-2", "p1").await?;

    eyre::ensure!(backend_pr.reviewers().is_empty(), "u2 left backend");
    eyre::ensure!(platform_pr.reviewers() == [user_id("u2")?], "u2 joined platform");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn resync_overwrites_name_and_activity(engine: Arc<TestEngine>) -> Result<(), eyre::Report> {
    create_team(&engine, "backend", &["u1"]).await?;
    let request = CreateTeamRequest::new("platform")
        .with_member(TeamMember::new("u1", "Renamed", false)?);

    let team = engine.teams().create_team(request).await?;

    let member = team
        .members()
        .first()
        .ok_or_else(|| eyre::eyre!("platform has no members"))?;
    eyre::ensure!(member.name() == "Renamed", "name not synchronized");
    eyre::ensure!(!member.is_active(), "activity not synchronized");
    eyre::ensure!(member.team_id() == team.id(), "user not moved");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_team_creation_leaves_users_where_they_were(
    engine: Arc<TestEngine>,
) -> Result<(), eyre::Report> {
    let backend = create_team(&engine, "backend", &["u1", "u2"]).await?;

    let result = create_team(&engine, "backend", &["u1", "u3"]).await;

    let err = result.err().ok_or_else(|| eyre::eyre!("duplicate should fail"))?;
    eyre::ensure!(
        matches!(err.downcast_ref::<ReviewError>(), Some(ReviewError::TeamExists(_))),
        "expected TeamExists, got {err:?}"
    );
    let stored = engine.teams().get_team(&TeamName::new("backend")?).await?;
    eyre::ensure!(stored == backend, "original team changed");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reactivated_user_returns_to_the_pool(engine: Arc<TestEngine>) -> Result<(), eyre::Report> {
    create_team(&engine, "backend", &["u1", "u2"]).await?;
    let u2 = user_id("u2")?;

    engine.users().set_active(&u2, false).await?;
    let without = open_pull_request(&engine, "pr-1", "u1").await?;
    let profile = engine.users().set_active(&u2, true).await?;
    let with = open_pull_request(&engine, "pr-2", "u1").await?;

    eyre::ensure!(without.reviewers().is_empty(), "inactive user was selected");
    eyre::ensure!(profile.user.is_active(), "profile not reactivated");
    eyre::ensure!(profile.team_name.as_str() == "backend", "wrong team name");
    eyre::ensure!(with.reviewers() == [u2.clone()], "active user not selected");
    let assigned = engine.users().assigned_pull_requests(&u2).await?;
    eyre::ensure!(
        assigned.iter().map(|pr| pr.id().clone()).collect::<Vec<_>>() == [pr_id("pr-2")?],
        "unexpected assignments {assigned:?}"
    );
    Ok(())
}
