//! Persistence, rollback and error classification against `PostgreSQL`.

use super::helpers::{PostgresCluster, create_team, open_request, postgres_cluster, prepare};
use reviewer_assigner::review::{
    domain::{MAX_REVIEWERS, PullRequestStatus, TeamName, UserId},
    ports::{ReviewStore, ReviewStoreError, ReviewTransaction},
    services::ReviewError,
};
use rstest::rstest;

#[rstest]
fn team_round_trips_with_members(postgres_cluster: PostgresCluster) -> Result<(), eyre::Report> {
    let pg = prepare(postgres_cluster)?;
    pg.runtime.block_on(async {
        create_team(&pg.engine, "backend", &[("u1", true), ("u2", false)]).await?;

        let team = pg.engine.teams().get_team(&TeamName::new("backend")?).await?;
        let members: Vec<(&str, bool)> = team
            .members()
            .iter()
            .map(|member| (member.id().as_str(), member.is_active()))
            .collect();
        eyre::ensure!(
            members == vec![("u1", true), ("u2", false)],
            "unexpected members {members:?}"
        );

        let duplicate = create_team(&pg.engine, "backend", &[("u3", true)]).await;
        let err = duplicate
            .err()
            .ok_or_else(|| eyre::eyre!("duplicate team accepted"))?;
        eyre::ensure!(
            matches!(
                err.downcast_ref::<ReviewError>(),
                Some(ReviewError::TeamExists(_))
            ),
            "unexpected error {err:?}"
        );
        Ok(())
    })
}

#[rstest]
fn pull_request_lifecycle_persists(postgres_cluster: PostgresCluster) -> Result<(), eyre::Report> {
    let pg = prepare(postgres_cluster)?;
    pg.runtime.block_on(async {
        create_team(&pg.engine, "backend", &[("u1", true), ("u2", true), ("u3", true)]).await?;

        let created = pg
            .engine
            .pull_requests()
            .create_and_assign(open_request("pr-1", "u1"))
            .await?;
        eyre::ensure!(
            created.reviewers().len() == MAX_REVIEWERS,
            "expected two reviewers"
        );
        let fetched = pg.engine.pull_requests().find(created.id()).await?;
        eyre::ensure!(fetched == created, "stored pull request differs: {fetched:?}");

        let duplicate = pg
            .engine
            .pull_requests()
            .create_and_assign(open_request("pr-1", "u2"))
            .await;
        eyre::ensure!(
            matches!(duplicate, Err(ReviewError::PullRequestExists(_))),
            "unexpected outcome {duplicate:?}"
        );

        let merged = pg.engine.pull_requests().merge(created.id()).await?;
        let again = pg.engine.pull_requests().merge(created.id()).await?;
        eyre::ensure!(merged.status() == PullRequestStatus::Merged, "not merged");
        eyre::ensure!(
            again.merged_at() == merged.merged_at(),
            "second merge moved the timestamp"
        );
        Ok(())
    })
}

#[rstest]
fn reassign_swaps_reviewer_in_storage(
    postgres_cluster: PostgresCluster,
) -> Result<(), eyre::Report> {
    let pg = prepare(postgres_cluster)?;
    pg.runtime.block_on(async {
        create_team(
            &pg.engine,
            "backend",
            &[("u1", true), ("u2", true), ("u3", true), ("u4", false)],
        )
        .await?;
        let created = pg
            .engine
            .pull_requests()
            .create_and_assign(open_request("pr-1", "u1"))
            .await?;
        let old = created
            .reviewers()
            .first()
            .cloned()
            .ok_or_else(|| eyre::eyre!("no reviewers assigned"))?;

        let blocked = pg.engine.pull_requests().reassign(created.id(), &old).await;
        eyre::ensure!(
            matches!(blocked, Err(ReviewError::NoCandidate(_))),
            "unexpected outcome {blocked:?}"
        );

        pg.engine.users().set_active(&UserId::new("u4")?, true).await?;
        let swapped = pg.engine.pull_requests().reassign(created.id(), &old).await?;
        eyre::ensure!(
            swapped.new_reviewer.as_str() == "u4",
            "unexpected replacement {}",
            swapped.new_reviewer.as_str()
        );
        let stored = pg.engine.pull_requests().find(created.id()).await?;
        eyre::ensure!(!stored.reviewers().contains(&old), "old reviewer kept");
        eyre::ensure!(
            stored.reviewers().last() == Some(&swapped.new_reviewer),
            "new reviewer not appended"
        );
        eyre::ensure!(
            stored.reviewers().len() == MAX_REVIEWERS,
            "reviewer count changed"
        );
        Ok(())
    })
}

#[rstest]
fn rolled_back_transaction_leaves_no_trace(
    postgres_cluster: PostgresCluster,
) -> Result<(), eyre::Report> {
    let pg = prepare(postgres_cluster)?;
    pg.runtime.block_on(async {
        let mut tx = pg.store.begin().await?;
        tx.insert_team(&TeamName::new("ghost")?).await?;
        tx.rollback().await?;

        let found = pg.store.find_team_by_name(&TeamName::new("ghost")?).await?;
        eyre::ensure!(found.is_none(), "rolled back team is visible");
        Ok(())
    })
}

#[rstest]
fn dropped_transaction_rolls_back(postgres_cluster: PostgresCluster) -> Result<(), eyre::Report> {
    let pg = prepare(postgres_cluster)?;
    pg.runtime.block_on(async {
        let mut abandoned = pg.store.begin().await?;
        abandoned.insert_team(&TeamName::new("ghost")?).await?;
        drop(abandoned);

        // The insert above holds the name until the rollback lands.
        let team = create_team(&pg.engine, "ghost", &[("u1", true)]).await?;
        eyre::ensure!(team.members().len() == 1, "team not created after rollback");
        let stats = pg.engine.stats().stats().await?;
        eyre::ensure!(stats.total_teams == 1, "teams: {}", stats.total_teams);
        Ok(())
    })
}

#[rstest]
fn duplicate_team_insert_is_classified(
    postgres_cluster: PostgresCluster,
) -> Result<(), eyre::Report> {
    let pg = prepare(postgres_cluster)?;
    pg.runtime.block_on(async {
        create_team(&pg.engine, "backend", &[("u1", true)]).await?;

        let mut tx = pg.store.begin().await?;
        let outcome = tx.insert_team(&TeamName::new("backend")?).await;
        eyre::ensure!(
            matches!(outcome, Err(ReviewStoreError::DuplicateTeam(_))),
            "unexpected outcome {outcome:?}"
        );
        tx.rollback().await?;
        Ok(())
    })
}

#[rstest]
fn stats_count_committed_rows(postgres_cluster: PostgresCluster) -> Result<(), eyre::Report> {
    let pg = prepare(postgres_cluster)?;
    pg.runtime.block_on(async {
        create_team(&pg.engine, "backend", &[("u1", true), ("u2", true), ("u3", true)]).await?;
        create_team(&pg.engine, "frontend", &[("u4", true)]).await?;
        let first = pg
            .engine
            .pull_requests()
            .create_and_assign(open_request("pr-1", "u1"))
            .await?;
        pg.engine
            .pull_requests()
            .create_and_assign(open_request("pr-2", "u4"))
            .await?;
        pg.engine.pull_requests().merge(first.id()).await?;

        let stats = pg.engine.stats().stats().await?;
        eyre::ensure!(stats.total_teams == 2, "teams: {}", stats.total_teams);
        eyre::ensure!(stats.total_users == 4, "users: {}", stats.total_users);
        eyre::ensure!(
            stats.total_pull_requests == 2,
            "prs: {}",
            stats.total_pull_requests
        );
        eyre::ensure!(
            stats.open_pull_requests == 1,
            "open: {}",
            stats.open_pull_requests
        );
        eyre::ensure!(
            stats.merged_pull_requests == 1,
            "merged: {}",
            stats.merged_pull_requests
        );
        let loads: Vec<(&str, u64)> = stats
            .reviewers
            .iter()
            .map(|load| (load.user_id.as_str(), load.review_count))
            .collect();
        eyre::ensure!(
            loads == vec![("u2", 1), ("u3", 1)],
            "unexpected reviewer loads {loads:?}"
        );
        Ok(())
    })
}
