//! Then steps for reviewer assignment BDD scenarios.

use super::world::{ReviewWorld, pr_id, run_async, sorted_user_ids, user_id};
use reviewer_assigner::review::{
    domain::{MAX_REVIEWERS, PullRequest, TeamName},
    services::{Reassignment, ReviewError},
};
use rstest_bdd_macros::then;

fn current(world: &ReviewWorld) -> Result<&PullRequest, eyre::Report> {
    world
        .last_pull_request
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing pull request in scenario world"))
}

fn reassignment_result(
    world: &ReviewWorld,
) -> Result<&Result<Reassignment, ReviewError>, eyre::Report> {
    world
        .last_reassignment
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing reassignment result in scenario world"))
}

#[then("the pull request reviewer count is {count:usize}")]
fn reviewer_count(world: &ReviewWorld, count: usize) -> Result<(), eyre::Report> {
    let pull_request = current(world)?;
    eyre::ensure!(
        pull_request.reviewers().len() == count,
        "expected {count} reviewers, found {:?}",
        pull_request.reviewers()
    );
    eyre::ensure!(count <= MAX_REVIEWERS, "scenario expects too many reviewers");
    Ok(())
}

#[then(r#""{user}" is not a reviewer of the pull request"#)]
fn not_a_reviewer(world: &ReviewWorld, user: String) -> Result<(), eyre::Report> {
    let pull_request = current(world)?;
    eyre::ensure!(
        !pull_request.is_reviewer(&user_id(&user)?),
        "{user} unexpectedly reviews {}",
        pull_request.id()
    );
    Ok(())
}

#[then(r#"the pull request reviewers are "{members}""#)]
fn reviewers_are(world: &ReviewWorld, members: String) -> Result<(), eyre::Report> {
    let pull_request = current(world)?;
    let mut actual = pull_request.reviewers().to_vec();
    actual.sort();
    let expected = sorted_user_ids(&members)?;
    eyre::ensure!(
        actual == expected,
        "expected reviewers {expected:?}, found {actual:?}"
    );
    let stored = world.fetch(pull_request.id().as_str())?;
    eyre::ensure!(&stored == pull_request, "stored pull request differs");
    Ok(())
}

#[then(r#"the new reviewer is "{user}""#)]
fn new_reviewer_is(world: &ReviewWorld, user: String) -> Result<(), eyre::Report> {
    let reassignment = reassignment_result(world)?
        .as_ref()
        .map_err(|err| eyre::eyre!("unexpected reassignment failure: {err}"))?;
    eyre::ensure!(
        reassignment.new_reviewer == user_id(&user)?,
        "expected {user}, got {}",
        reassignment.new_reviewer
    );
    Ok(())
}

#[then("reassignment fails because no candidate is available")]
fn fails_with_no_candidate(world: &ReviewWorld) -> Result<(), eyre::Report> {
    let result = reassignment_result(world)?;
    eyre::ensure!(
        matches!(result, Err(ReviewError::NoCandidate(_))),
        "expected NoCandidate, got {result:?}"
    );
    Ok(())
}

#[then("reassignment fails because the reviewer is not assigned")]
fn fails_with_not_assigned(world: &ReviewWorld) -> Result<(), eyre::Report> {
    let result = reassignment_result(world)?;
    eyre::ensure!(
        matches!(result, Err(ReviewError::NotAssigned { .. })),
        "expected NotAssigned, got {result:?}"
    );
    Ok(())
}

#[then("reassignment fails because the pull request is merged")]
fn fails_with_merged(world: &ReviewWorld) -> Result<(), eyre::Report> {
    let result = reassignment_result(world)?;
    eyre::ensure!(
        matches!(result, Err(ReviewError::PullRequestMerged(_))),
        "expected PullRequestMerged, got {result:?}"
    );
    Ok(())
}

#[then(r#"pull request "{pr}" is unchanged"#)]
fn pull_request_unchanged(world: &ReviewWorld, pr: String) -> Result<(), eyre::Report> {
    let before = world
        .before_reassignment
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing snapshot taken before reassignment"))?;
    let after = world.fetch(&pr)?;
    eyre::ensure!(&after == before, "pull request {pr} changed: {after:?}");
    Ok(())
}

#[then(r#"the pull request status is "{status}""#)]
fn status_is(world: &ReviewWorld, status: String) -> Result<(), eyre::Report> {
    let pull_request = current(world)?;
    eyre::ensure!(
        pull_request.status().as_str() == status,
        "expected status {status}, found {}",
        pull_request.status().as_str()
    );
    eyre::ensure!(pull_request.merged_at().is_some(), "merge timestamp missing");
    Ok(())
}

#[then("the merge timestamp is unchanged")]
fn merge_timestamp_unchanged(world: &ReviewWorld) -> Result<(), eyre::Report> {
    let first = world
        .first_merge
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing first merge in scenario world"))?;
    let latest = current(world)?;
    eyre::ensure!(
        first.merged_at() == latest.merged_at(),
        "merge timestamp moved from {:?} to {:?}",
        first.merged_at(),
        latest.merged_at()
    );
    Ok(())
}

#[then("team creation fails because the team exists")]
fn team_exists(world: &ReviewWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_team_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing team result in scenario world"))?;
    eyre::ensure!(
        matches!(result, Err(ReviewError::TeamExists(_))),
        "expected TeamExists, got {result:?}"
    );
    Ok(())
}

#[then(r#"team "{name}" has members "{members}""#)]
fn team_has_members(
    world: &ReviewWorld,
    name: String,
    members: String,
) -> Result<(), eyre::Report> {
    let team_name = TeamName::new(name).map_err(|err| eyre::eyre!("invalid team name: {err}"))?;
    let team = run_async(world.engine.teams().get_team(&team_name))
        .map_err(|err| eyre::eyre!("team lookup failed: {err}"))?;
    let actual: Vec<_> = team.members().iter().map(|user| user.id().clone()).collect();
    let expected = sorted_user_ids(&members)?;
    eyre::ensure!(
        actual == expected,
        "expected members {expected:?}, found {actual:?}"
    );
    Ok(())
}

#[then(r#""{user}" still reviews pull request "{pr}""#)]
fn still_reviews(world: &ReviewWorld, user: String, pr: String) -> Result<(), eyre::Report> {
    let reviewer = user_id(&user)?;
    let id = pr_id(&pr)?;
    let assigned = run_async(world.engine.users().assigned_pull_requests(&reviewer))
        .map_err(|err| eyre::eyre!("listing assignments failed: {err}"))?;
    eyre::ensure!(
        assigned.iter().any(|pull_request| pull_request.id() == &id),
        "{user} no longer reviews {pr}"
    );
    Ok(())
}
