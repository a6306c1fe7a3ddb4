//! `PostgreSQL` store and transaction implementation.

use super::{SCHEMA_SQL, queries};
use crate::config::DatabaseSettings;
use crate::review::{
    domain::{PullRequest, PullRequestId, ReviewStats, Team, TeamId, TeamName, User, UserId},
    ports::{ReviewStore, ReviewStoreError, ReviewStoreResult, ReviewTransaction},
};
use async_trait::async_trait;
use diesel::connection::{AnsiTransactionManager, SimpleConnection, TransactionManager};
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use thiserror::Error;
use tracing::{debug, info, warn};

/// `PostgreSQL` connection pool type used by the review store.
pub type ReviewPgPool = Pool<ConnectionManager<PgConnection>>;

type PooledPgConnection = PooledConnection<ConnectionManager<PgConnection>>;

/// Raised when a transaction is used after its connection was released.
#[derive(Debug, Error)]
#[error("review transaction connection is no longer available")]
struct TransactionClosed;

/// `PostgreSQL`-backed review store.
///
/// All Diesel calls run on the blocking thread pool via
/// [`tokio::task::spawn_blocking`].
#[derive(Debug, Clone)]
pub struct PostgresReviewStore {
    pool: ReviewPgPool,
}

impl PostgresReviewStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: ReviewPgPool) -> Self {
        Self { pool }
    }

    /// Builds a connection pool from `settings` and wraps it in a store.
    ///
    /// Establishes the idle connections eagerly, so this blocks for up to
    /// the configured connect timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewStoreError::Persistence`] when the pool cannot be
    /// built.
    pub fn connect(settings: &DatabaseSettings) -> ReviewStoreResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&settings.database_url);
        let pool = Pool::builder()
            .max_size(settings.pool_max_size)
            .min_idle(Some(settings.pool_min_idle))
            .max_lifetime(Some(settings.max_lifetime()))
            .idle_timeout(Some(settings.idle_timeout()))
            .connection_timeout(settings.connect_timeout())
            .build(manager)
            .map_err(ReviewStoreError::persistence)?;
        info!(
            max_size = settings.pool_max_size,
            min_idle = settings.pool_min_idle,
            "review store connection pool ready"
        );
        Ok(Self::new(pool))
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub const fn pool(&self) -> &ReviewPgPool {
        &self.pool
    }

    /// Creates the review tables.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewStoreError::Persistence`] when the DDL fails, for
    /// example because the tables already exist.
    pub async fn apply_schema(&self) -> ReviewStoreResult<()> {
        self.run_blocking(|connection| {
            connection
                .batch_execute(SCHEMA_SQL)
                .map_err(ReviewStoreError::persistence)
        })
        .await?;
        info!("review schema applied");
        Ok(())
    }

    async fn run_blocking<F, T>(&self, f: F) -> ReviewStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> ReviewStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(ReviewStoreError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(ReviewStoreError::persistence)?
    }
}

#[async_trait]
impl ReviewStore for PostgresReviewStore {
    type Transaction = PostgresReviewTransaction;

    async fn begin(&self) -> ReviewStoreResult<Self::Transaction> {
        let pool = self.pool.clone();
        let connection = tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(ReviewStoreError::persistence)?;
            <AnsiTransactionManager as TransactionManager<PgConnection>>::begin_transaction(
                &mut *connection,
            )
            .map_err(ReviewStoreError::persistence)?;
            Ok::<_, ReviewStoreError>(connection)
        })
        .await
        .map_err(ReviewStoreError::persistence)??;
        Ok(PostgresReviewTransaction {
            connection: Some(connection),
        })
    }

    async fn find_user(&self, id: &UserId) -> ReviewStoreResult<Option<User>> {
        let lookup = id.clone();
        self.run_blocking(move |connection| queries::user(connection, &lookup))
            .await
    }

    async fn active_team_member_ids(
        &self,
        team_id: TeamId,
        exclude: &UserId,
    ) -> ReviewStoreResult<Vec<UserId>> {
        let excluded = exclude.clone();
        self.run_blocking(move |connection| {
            queries::active_member_ids(connection, team_id, &excluded)
        })
        .await
    }

    async fn find_team_by_name(&self, name: &TeamName) -> ReviewStoreResult<Option<Team>> {
        let lookup = name.clone();
        self.run_blocking(move |connection| queries::team_by_name(connection, &lookup))
            .await
    }

    async fn find_pull_request(
        &self,
        id: &PullRequestId,
    ) -> ReviewStoreResult<Option<PullRequest>> {
        let lookup = id.clone();
        self.run_blocking(move |connection| queries::pull_request(connection, &lookup))
            .await
    }

    async fn list_by_reviewer(&self, reviewer: &UserId) -> ReviewStoreResult<Vec<PullRequest>> {
        let lookup = reviewer.clone();
        self.run_blocking(move |connection| queries::by_reviewer(connection, &lookup))
            .await
    }

    async fn stats(&self) -> ReviewStoreResult<ReviewStats> {
        self.run_blocking(queries::stats).await
    }
}

/// Open `PostgreSQL` transaction holding one pooled connection.
///
/// Dropping the transaction without committing issues a rollback on the
/// blocking pool. If the rollback cannot run, the connection is discarded by
/// the pool and the server aborts the transaction when it closes.
pub struct PostgresReviewTransaction {
    connection: Option<PooledPgConnection>,
}

impl std::fmt::Debug for PostgresReviewTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresReviewTransaction")
            .field("open", &self.connection.is_some())
            .finish()
    }
}

impl PostgresReviewTransaction {
    async fn run<F, T>(&mut self, f: F) -> ReviewStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> ReviewStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let mut taken = self
            .connection
            .take()
            .ok_or_else(|| ReviewStoreError::persistence(TransactionClosed))?;
        let (returned, result) = tokio::task::spawn_blocking(move || {
            let outcome = f(&mut *taken);
            (taken, outcome)
        })
        .await
        .map_err(ReviewStoreError::persistence)?;
        self.connection = Some(returned);
        result
    }

    async fn finish(mut self, commit: bool) -> ReviewStoreResult<()> {
        self.run(move |connection| {
            if commit {
                <AnsiTransactionManager as TransactionManager<PgConnection>>::commit_transaction(
                    connection,
                )
            } else {
                <AnsiTransactionManager as TransactionManager<PgConnection>>::rollback_transaction(
                    connection,
                )
            }
            .map_err(ReviewStoreError::persistence)
        })
        .await?;
        // Hand the connection back to the pool outside any transaction.
        drop(self.connection.take());
        Ok(())
    }
}

#[async_trait]
impl ReviewTransaction for PostgresReviewTransaction {
    async fn insert_team(&mut self, name: &TeamName) -> ReviewStoreResult<TeamId> {
        let team_name = name.clone();
        self.run(move |connection| queries::insert_team(connection, &team_name))
            .await
    }

    async fn find_team_name(&mut self, team_id: TeamId) -> ReviewStoreResult<Option<TeamName>> {
        self.run(move |connection| queries::team_name(connection, team_id))
            .await
    }

    async fn find_user(&mut self, id: &UserId) -> ReviewStoreResult<Option<User>> {
        let lookup = id.clone();
        self.run(move |connection| queries::user(connection, &lookup))
            .await
    }

    async fn insert_user(&mut self, user: &User) -> ReviewStoreResult<()> {
        let record = user.clone();
        self.run(move |connection| queries::insert_user(connection, &record))
            .await
    }

    async fn update_user(&mut self, user: &User) -> ReviewStoreResult<()> {
        let record = user.clone();
        self.run(move |connection| queries::update_user(connection, &record))
            .await
    }

    async fn insert_pull_request(&mut self, pull_request: &PullRequest) -> ReviewStoreResult<()> {
        let record = pull_request.clone();
        self.run(move |connection| queries::insert_pull_request(connection, &record))
            .await
    }

    async fn update_pull_request(&mut self, pull_request: &PullRequest) -> ReviewStoreResult<()> {
        let record = pull_request.clone();
        self.run(move |connection| queries::update_pull_request(connection, &record))
            .await
    }

    async fn lock_pull_request(
        &mut self,
        id: &PullRequestId,
    ) -> ReviewStoreResult<Option<PullRequest>> {
        let lookup = id.clone();
        self.run(move |connection| queries::pull_request_for_update(connection, &lookup))
            .await
    }

    async fn add_reviewer(
        &mut self,
        pull_request: &PullRequestId,
        reviewer: &UserId,
    ) -> ReviewStoreResult<()> {
        let pr_id = pull_request.clone();
        let user_id = reviewer.clone();
        self.run(move |connection| queries::add_reviewer(connection, &pr_id, &user_id))
            .await
    }

    async fn remove_reviewer(
        &mut self,
        pull_request: &PullRequestId,
        reviewer: &UserId,
    ) -> ReviewStoreResult<()> {
        let pr_id = pull_request.clone();
        let user_id = reviewer.clone();
        self.run(move |connection| queries::remove_reviewer(connection, &pr_id, &user_id))
            .await
    }

    async fn commit(self) -> ReviewStoreResult<()> {
        self.finish(true).await?;
        debug!("review transaction committed");
        Ok(())
    }

    async fn rollback(self) -> ReviewStoreResult<()> {
        self.finish(false).await?;
        debug!("review transaction rolled back");
        Ok(())
    }
}

impl Drop for PostgresReviewTransaction {
    fn drop(&mut self) {
        let Some(mut connection) = self.connection.take() else {
            return;
        };
        let mut rollback = move || {
            let result =
                <AnsiTransactionManager as TransactionManager<PgConnection>>::rollback_transaction(
                    &mut *connection,
                );
            if let Err(err) = result {
                warn!(error = %err, "failed to roll back abandoned review transaction");
            }
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => drop(handle.spawn_blocking(rollback)),
            Err(_) => rollback(),
        }
    }
}
