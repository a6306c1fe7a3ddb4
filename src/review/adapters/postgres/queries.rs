//! Blocking Diesel queries shared by the store and its transactions.

use super::{
    models::{NewPullRequestRow, NewReviewerLinkRow, NewTeamRow, PullRequestRow, UserRow},
    schema::{pr_reviewers, pull_requests, teams, users},
};
use crate::review::{
    domain::{
        PersistedPullRequestData, PullRequest, PullRequestId, PullRequestStatus, ReviewStats,
        ReviewerLoad, Team, TeamId, TeamName, User, UserId,
    },
    ports::{ReviewStoreError, ReviewStoreResult},
};
use diesel::dsl::count;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use std::collections::HashMap;

pub(super) fn insert_team(connection: &mut PgConnection, name: &TeamName) -> ReviewStoreResult<TeamId> {
    diesel::insert_into(teams::table)
        .values(&NewTeamRow {
            name: name.as_str().to_owned(),
        })
        .returning(teams::id)
        .get_result::<i64>(connection)
        .map(TeamId::new)
        .map_err(|err| match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                ReviewStoreError::DuplicateTeam(name.clone())
            }
            _ => ReviewStoreError::persistence(err),
        })
}

pub(super) fn team_name(
    connection: &mut PgConnection,
    team_id: TeamId,
) -> ReviewStoreResult<Option<TeamName>> {
    let name = teams::table
        .filter(teams::id.eq(team_id.value()))
        .select(teams::name)
        .first::<String>(connection)
        .optional()
        .map_err(ReviewStoreError::persistence)?;
    name.map(|value| TeamName::new(value).map_err(ReviewStoreError::invalid_persisted_data))
        .transpose()
}

pub(super) fn team_by_name(
    connection: &mut PgConnection,
    name: &TeamName,
) -> ReviewStoreResult<Option<Team>> {
    let found = teams::table
        .filter(teams::name.eq(name.as_str()))
        .select(teams::id)
        .first::<i64>(connection)
        .optional()
        .map_err(ReviewStoreError::persistence)?;
    let Some(team_id) = found else {
        return Ok(None);
    };
    let members = users::table
        .filter(users::team_id.eq(team_id))
        .select(UserRow::as_select())
        .load::<UserRow>(connection)
        .map_err(ReviewStoreError::persistence)?
        .into_iter()
        .map(row_to_user)
        .collect::<ReviewStoreResult<Vec<_>>>()?;
    Ok(Some(Team::new(TeamId::new(team_id), name.clone(), members)))
}

pub(super) fn user(connection: &mut PgConnection, id: &UserId) -> ReviewStoreResult<Option<User>> {
    let row = users::table
        .filter(users::id.eq(id.as_str()))
        .select(UserRow::as_select())
        .first::<UserRow>(connection)
        .optional()
        .map_err(ReviewStoreError::persistence)?;
    row.map(row_to_user).transpose()
}

pub(super) fn active_member_ids(
    connection: &mut PgConnection,
    team_id: TeamId,
    exclude: &UserId,
) -> ReviewStoreResult<Vec<UserId>> {
    users::table
        .filter(users::team_id.eq(team_id.value()))
        .filter(users::is_active.eq(true))
        .filter(users::id.ne(exclude.as_str()))
        .order(users::id.asc())
        .select(users::id)
        .load::<String>(connection)
        .map_err(ReviewStoreError::persistence)?
        .into_iter()
        .map(parse_user_id)
        .collect()
}

pub(super) fn insert_user(connection: &mut PgConnection, user: &User) -> ReviewStoreResult<()> {
    diesel::insert_into(users::table)
        .values(&to_user_row(user))
        .execute(connection)
        .map_err(|err| match err {
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                ReviewStoreError::TeamNotFound(user.team_id())
            }
            _ => ReviewStoreError::persistence(err),
        })?;
    Ok(())
}

pub(super) fn update_user(connection: &mut PgConnection, user: &User) -> ReviewStoreResult<()> {
    let updated = diesel::update(users::table.filter(users::id.eq(user.id().as_str())))
        .set((
            users::username.eq(user.name()),
            users::is_active.eq(user.is_active()),
            users::team_id.eq(user.team_id().value()),
        ))
        .execute(connection)
        .map_err(|err| match err {
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                ReviewStoreError::TeamNotFound(user.team_id())
            }
            _ => ReviewStoreError::persistence(err),
        })?;
    if updated == 0 {
        return Err(ReviewStoreError::UserNotFound(user.id().clone()));
    }
    Ok(())
}

pub(super) fn insert_pull_request(
    connection: &mut PgConnection,
    pull_request: &PullRequest,
) -> ReviewStoreResult<()> {
    let row = NewPullRequestRow {
        id: pull_request.id().as_str().to_owned(),
        title: pull_request.title().to_owned(),
        author_id: pull_request.author_id().as_str().to_owned(),
        status: pull_request.status().as_str().to_owned(),
        created_at: pull_request.created_at(),
        merged_at: pull_request.merged_at(),
    };
    diesel::insert_into(pull_requests::table)
        .values(&row)
        .execute(connection)
        .map_err(|err| match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                ReviewStoreError::DuplicatePullRequest(pull_request.id().clone())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                ReviewStoreError::UserNotFound(pull_request.author_id().clone())
            }
            _ => ReviewStoreError::persistence(err),
        })?;
    Ok(())
}

pub(super) fn update_pull_request(
    connection: &mut PgConnection,
    pull_request: &PullRequest,
) -> ReviewStoreResult<()> {
    let updated = diesel::update(
        pull_requests::table.filter(pull_requests::id.eq(pull_request.id().as_str())),
    )
    .set((
        pull_requests::status.eq(pull_request.status().as_str()),
        pull_requests::merged_at.eq(pull_request.merged_at()),
    ))
    .execute(connection)
    .map_err(ReviewStoreError::persistence)?;
    if updated == 0 {
        return Err(ReviewStoreError::PullRequestNotFound(pull_request.id().clone()));
    }
    Ok(())
}

pub(super) fn pull_request(
    connection: &mut PgConnection,
    id: &PullRequestId,
) -> ReviewStoreResult<Option<PullRequest>> {
    let row = pull_requests::table
        .filter(pull_requests::id.eq(id.as_str()))
        .select(PullRequestRow::as_select())
        .first::<PullRequestRow>(connection)
        .optional()
        .map_err(ReviewStoreError::persistence)?;
    attach_single(connection, row)
}

/// Loads a pull request with `SELECT ... FOR UPDATE`.
pub(super) fn pull_request_for_update(
    connection: &mut PgConnection,
    id: &PullRequestId,
) -> ReviewStoreResult<Option<PullRequest>> {
    let row = pull_requests::table
        .filter(pull_requests::id.eq(id.as_str()))
        .select(PullRequestRow::as_select())
        .for_update()
        .first::<PullRequestRow>(connection)
        .optional()
        .map_err(ReviewStoreError::persistence)?;
    attach_single(connection, row)
}

pub(super) fn add_reviewer(
    connection: &mut PgConnection,
    pull_request: &PullRequestId,
    reviewer: &UserId,
) -> ReviewStoreResult<()> {
    diesel::insert_into(pr_reviewers::table)
        .values(&NewReviewerLinkRow {
            pr_id: pull_request.as_str().to_owned(),
            user_id: reviewer.as_str().to_owned(),
        })
        .on_conflict((pr_reviewers::pr_id, pr_reviewers::user_id))
        .do_nothing()
        .execute(connection)
        .map_err(|err| match err {
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, ref info)
                if is_constraint(info.as_ref(), "pr_reviewers_pr_id_fkey") =>
            {
                ReviewStoreError::PullRequestNotFound(pull_request.clone())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                ReviewStoreError::UserNotFound(reviewer.clone())
            }
            _ => ReviewStoreError::persistence(err),
        })?;
    Ok(())
}

pub(super) fn remove_reviewer(
    connection: &mut PgConnection,
    pull_request: &PullRequestId,
    reviewer: &UserId,
) -> ReviewStoreResult<()> {
    let removed = diesel::delete(
        pr_reviewers::table
            .filter(pr_reviewers::pr_id.eq(pull_request.as_str()))
            .filter(pr_reviewers::user_id.eq(reviewer.as_str())),
    )
    .execute(connection)
    .map_err(ReviewStoreError::persistence)?;
    if removed == 0 {
        return Err(ReviewStoreError::ReviewerNotAssigned {
            pull_request: pull_request.clone(),
            reviewer: reviewer.clone(),
        });
    }
    Ok(())
}

pub(super) fn by_reviewer(
    connection: &mut PgConnection,
    reviewer: &UserId,
) -> ReviewStoreResult<Vec<PullRequest>> {
    let rows = pull_requests::table
        .inner_join(pr_reviewers::table)
        .filter(pr_reviewers::user_id.eq(reviewer.as_str()))
        .order((pull_requests::created_at.asc(), pull_requests::id.asc()))
        .select(PullRequestRow::as_select())
        .load::<PullRequestRow>(connection)
        .map_err(ReviewStoreError::persistence)?;
    let ids: Vec<String> = rows.iter().map(|row| row.id.clone()).collect();
    let links = pr_reviewers::table
        .filter(pr_reviewers::pr_id.eq_any(ids))
        .order(pr_reviewers::id.asc())
        .select((pr_reviewers::pr_id, pr_reviewers::user_id))
        .load::<(String, String)>(connection)
        .map_err(ReviewStoreError::persistence)?;
    let mut reviewers_by_pr: HashMap<String, Vec<String>> = HashMap::new();
    for (pr_id, user_id) in links {
        reviewers_by_pr.entry(pr_id).or_default().push(user_id);
    }
    rows.into_iter()
        .map(|row| {
            let reviewers = reviewers_by_pr.remove(&row.id).unwrap_or_default();
            row_to_pull_request(row, reviewers)
        })
        .collect()
}

pub(super) fn stats(connection: &mut PgConnection) -> ReviewStoreResult<ReviewStats> {
    let total_teams = teams::table
        .count()
        .get_result::<i64>(connection)
        .map_err(ReviewStoreError::persistence)?;
    let total_users = users::table
        .count()
        .get_result::<i64>(connection)
        .map_err(ReviewStoreError::persistence)?;
    let total_pull_requests = pull_requests::table
        .count()
        .get_result::<i64>(connection)
        .map_err(ReviewStoreError::persistence)?;
    let open_pull_requests = count_status(connection, PullRequestStatus::Open)?;
    let merged_pull_requests = count_status(connection, PullRequestStatus::Merged)?;
    let loads = pr_reviewers::table
        .inner_join(users::table)
        .group_by((users::id, users::username))
        .select((users::id, users::username, count(pr_reviewers::id)))
        .load::<(String, String, i64)>(connection)
        .map_err(ReviewStoreError::persistence)?;

    let reviewers = loads
        .into_iter()
        .map(|(user_id, username, review_count)| {
            Ok(ReviewerLoad {
                user_id: parse_user_id(user_id)?,
                username,
                review_count: to_count(review_count)?,
            })
        })
        .collect::<ReviewStoreResult<Vec<_>>>()?;

    let mut stats = ReviewStats {
        total_teams: to_count(total_teams)?,
        total_users: to_count(total_users)?,
        total_pull_requests: to_count(total_pull_requests)?,
        open_pull_requests: to_count(open_pull_requests)?,
        merged_pull_requests: to_count(merged_pull_requests)?,
        reviewers,
    };
    stats.sort_reviewers();
    Ok(stats)
}

fn count_status(connection: &mut PgConnection, status: PullRequestStatus) -> ReviewStoreResult<i64> {
    pull_requests::table
        .filter(pull_requests::status.eq(status.as_str()))
        .count()
        .get_result::<i64>(connection)
        .map_err(ReviewStoreError::persistence)
}

fn attach_single(
    connection: &mut PgConnection,
    found: Option<PullRequestRow>,
) -> ReviewStoreResult<Option<PullRequest>> {
    let Some(row) = found else {
        return Ok(None);
    };
    let reviewers = pr_reviewers::table
        .filter(pr_reviewers::pr_id.eq(&row.id))
        .order(pr_reviewers::id.asc())
        .select(pr_reviewers::user_id)
        .load::<String>(connection)
        .map_err(ReviewStoreError::persistence)?;
    row_to_pull_request(row, reviewers).map(Some)
}

fn row_to_pull_request(row: PullRequestRow, reviewers: Vec<String>) -> ReviewStoreResult<PullRequest> {
    let PullRequestRow {
        id,
        title,
        author_id,
        status,
        created_at,
        merged_at,
    } = row;
    let data = PersistedPullRequestData {
        id: PullRequestId::new(id).map_err(ReviewStoreError::invalid_persisted_data)?,
        title,
        author_id: parse_user_id(author_id)?,
        status: PullRequestStatus::try_from(status.as_str())
            .map_err(ReviewStoreError::invalid_persisted_data)?,
        reviewers: reviewers
            .into_iter()
            .map(parse_user_id)
            .collect::<ReviewStoreResult<Vec<_>>>()?,
        created_at,
        merged_at,
    };
    Ok(PullRequest::from_persisted(data))
}

fn row_to_user(row: UserRow) -> ReviewStoreResult<User> {
    let UserRow {
        id,
        username,
        is_active,
        team_id,
    } = row;
    User::new(parse_user_id(id)?, username, TeamId::new(team_id), is_active)
        .map_err(ReviewStoreError::invalid_persisted_data)
}

fn to_user_row(user: &User) -> UserRow {
    UserRow {
        id: user.id().as_str().to_owned(),
        username: user.name().to_owned(),
        is_active: user.is_active(),
        team_id: user.team_id().value(),
    }
}

fn parse_user_id(value: String) -> ReviewStoreResult<UserId> {
    UserId::new(value).map_err(ReviewStoreError::invalid_persisted_data)
}

fn to_count(value: i64) -> ReviewStoreResult<u64> {
    u64::try_from(value).map_err(ReviewStoreError::invalid_persisted_data)
}

fn is_constraint(info: &dyn DatabaseErrorInformation, name: &str) -> bool {
    info.constraint_name().is_some_and(|constraint| constraint == name)
}
