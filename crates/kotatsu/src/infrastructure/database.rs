use std::{
    ops::{Deref, DerefMut},
    str::FromStr,
    time::Duration,
};

use sqlx::{
    migrate::MigrateError,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions},
};

use super::observer::InvalidationTracker;

/// Connection pool shared by the repositories, together with the tracker
/// their writes are reported to
#[derive(Clone)]
pub struct Pool {
    pool: SqlitePool,
    tracker: InvalidationTracker,
}

impl Pool {
    pub fn tracker(&self) -> &InvalidationTracker {
        &self.tracker
    }
}

impl From<SqlitePool> for Pool {
    fn from(pool: SqlitePool) -> Self {
        Self {
            pool,
            tracker: InvalidationTracker::new(),
        }
    }
}

impl Deref for Pool {
    type Target = SqlitePool;

    fn deref(&self) -> &Self::Target {
        &self.pool
    }
}

impl DerefMut for Pool {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.pool
    }
}

pub async fn establish_connection(
    database_path: &str,
    create: bool,
) -> Result<Pool, anyhow::Error> {
    let opts = SqliteConnectOptions::new()
        .create_if_missing(create)
        .filename(database_path)
        .journal_mode(SqliteJournalMode::Wal);

    let pool_opts = SqlitePoolOptions::new()
        .max_connections(5)
        .idle_timeout(Duration::from_secs(60))
        .max_lifetime(Duration::from_secs(3 * 60));

    connect_with(opts, pool_opts).await
}

/// Opens a private in-memory database. A single connection is kept open for
/// the lifetime of the pool, otherwise the database would vanish.
pub async fn establish_in_memory() -> Result<Pool, anyhow::Error> {
    let opts = SqliteConnectOptions::from_str("sqlite::memory:")?;

    let pool_opts = SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None);

    connect_with(opts, pool_opts).await
}

async fn connect_with(
    opts: SqliteConnectOptions,
    pool_opts: SqlitePoolOptions,
) -> Result<Pool, anyhow::Error> {
    let pool = pool_opts.connect_with(opts.foreign_keys(true)).await?;

    match sqlx::migrate!("./migrations").run(&pool).await {
        Err(MigrateError::VersionMismatch(version)) => {
            warn!("migration {version} was previously applied but has been modified")
        }
        Err(e) => {
            return Err(e.into());
        }
        _ => {}
    }

    Ok(Pool::from(pool))
}
