#![cfg_attr(
    not(any(feature = "pg", feature = "sqlite")),
    allow(unused_imports, unused_variables, dead_code, unreachable_code)
)]

//! ModKit database handle.
//!
//! A thin wrapper over one SQLx pool (SQLite or PostgreSQL) with a SeaORM
//! connection built on top of the same pool. Modules receive an
//! `Arc<DbHandle>` and run their migrations and repositories through `sea()`.
//!
//! # Features
//! - `pg`, `sqlite`: enable SQLx backends
//! - `sea-orm`: SeaORM integration
//!
//! # Example
//! ```rust,no_run
//! #[tokio::main]
//! async fn main() -> modkit_db::Result<()> {
//!     use modkit_db::{ConnectOpts, DbHandle};
//!
//!     let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default()).await?;
//!     let _conn = db.sea();
//!     db.close().await;
//!     Ok(())
//! }
//! ```

mod sqlite;

pub use sqlite::absolutize_sqlite_dsn;

use std::time::Duration;

#[cfg(feature = "pg")]
use sqlx::{postgres::PgPoolOptions, PgPool};
#[cfg(feature = "sqlite")]
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

#[cfg(feature = "sea-orm")]
use sea_orm::DatabaseConnection;
#[cfg(all(feature = "sea-orm", feature = "pg"))]
use sea_orm::SqlxPostgresConnector;
#[cfg(all(feature = "sea-orm", feature = "sqlite"))]
use sea_orm::SqlxSqliteConnector;

use thiserror::Error;

/// Library-local result type.
pub type Result<T> = std::result::Result<T, DbError>;

/// Typed error for the DB handle and helpers.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Unknown DSN: {0}")]
    UnknownDsn(String),

    #[error("Feature not enabled: {0}")]
    FeatureDisabled(&'static str),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[cfg(feature = "sea-orm")]
    #[error(transparent)]
    Sea(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Supported engines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbEngine {
    Postgres,
    Sqlite,
}

/// Pool knobs; each driver applies the subset it supports.
#[derive(Clone, Debug)]
pub struct ConnectOpts {
    pub max_conns: Option<u32>,
    pub min_conns: Option<u32>,
    pub acquire_timeout: Option<Duration>,
    pub idle_timeout: Option<Duration>,
    pub max_lifetime: Option<Duration>,
    /// SQLite `busy_timeout` applied to every file connection unless the DSN overrides it.
    pub busy_timeout_ms: u32,
    /// For SQLite file DSNs, create parent directories if missing.
    pub create_sqlite_dirs: bool,
}

impl Default for ConnectOpts {
    fn default() -> Self {
        Self {
            max_conns: Some(10),
            min_conns: None,
            acquire_timeout: Some(Duration::from_secs(30)),
            idle_timeout: None,
            max_lifetime: None,
            busy_timeout_ms: 5000,
            create_sqlite_dirs: true,
        }
    }
}

/// One concrete sqlx pool.
#[derive(Clone, Debug)]
pub enum DbPool {
    #[cfg(feature = "pg")]
    Postgres(PgPool),
    #[cfg(feature = "sqlite")]
    Sqlite(SqlitePool),
}

/// Main handle.
#[derive(Debug)]
pub struct DbHandle {
    engine: DbEngine,
    pool: DbPool,
    dsn: String,
    #[cfg(feature = "sea-orm")]
    sea: DatabaseConnection,
}

macro_rules! apply_pool_opts {
    ($builder:expr, $opts:expr) => {{
        let mut o = $builder;
        if let Some(n) = $opts.max_conns {
            o = o.max_connections(n);
        }
        if let Some(n) = $opts.min_conns {
            o = o.min_connections(n);
        }
        if let Some(t) = $opts.acquire_timeout {
            o = o.acquire_timeout(t);
        }
        if let Some(t) = $opts.idle_timeout {
            o = o.idle_timeout(t);
        }
        if let Some(t) = $opts.max_lifetime {
            o = o.max_lifetime(t);
        }
        o
    }};
}

impl DbHandle {
    /// Detect engine by DSN scheme.
    pub fn detect(dsn: &str) -> Result<DbEngine> {
        let s = dsn.trim_start();
        if s.starts_with("postgres://") || s.starts_with("postgresql://") {
            Ok(DbEngine::Postgres)
        } else if s.starts_with("sqlite:") {
            Ok(DbEngine::Sqlite)
        } else {
            Err(DbError::UnknownDsn(dsn.to_string()))
        }
    }

    /// Connect and build handle.
    pub async fn connect(dsn: &str, opts: ConnectOpts) -> Result<Self> {
        let engine = Self::detect(dsn)?;
        match engine {
            #[cfg(feature = "pg")]
            DbEngine::Postgres => {
                let pool = apply_pool_opts!(PgPoolOptions::new(), opts)
                    .connect(dsn)
                    .await?;
                tracing::info!(engine = "postgres", "database pool ready");
                #[cfg(feature = "sea-orm")]
                let sea = SqlxPostgresConnector::from_sqlx_postgres_pool(pool.clone());
                Ok(Self {
                    engine,
                    pool: DbPool::Postgres(pool),
                    dsn: dsn.to_string(),
                    #[cfg(feature = "sea-orm")]
                    sea,
                })
            }
            #[cfg(feature = "sqlite")]
            DbEngine::Sqlite => Self::connect_sqlite(dsn, opts).await,
            #[cfg(not(feature = "pg"))]
            DbEngine::Postgres => Err(DbError::FeatureDisabled("PostgreSQL feature not enabled")),
            #[cfg(not(feature = "sqlite"))]
            DbEngine::Sqlite => Err(DbError::FeatureDisabled("SQLite feature not enabled")),
        }
    }

    #[cfg(feature = "sqlite")]
    async fn connect_sqlite(dsn: &str, mut opts: ConnectOpts) -> Result<Self> {
        sqlite::prepare_sqlite_path(dsn, opts.create_sqlite_dirs)?;

        let (clean_dsn, pragmas) = sqlite::extract_sqlite_pragmas(dsn);
        let in_memory = sqlite::is_memory_dsn(&clean_dsn);

        // Every connection to `sqlite::memory:` opens a fresh database.
        if in_memory {
            opts.max_conns = Some(1);
            opts.min_conns = Some(1);
        }

        let journal_mode = pragmas.journal_mode.clone().unwrap_or_else(|| {
            if in_memory { "DELETE" } else { "WAL" }.to_string()
        });
        let synchronous = pragmas
            .synchronous
            .clone()
            .unwrap_or_else(|| "NORMAL".to_string());
        let busy_timeout = pragmas
            .busy_timeout
            .unwrap_or(i64::from(opts.busy_timeout_ms));

        let mut o = apply_pool_opts!(SqlitePoolOptions::new(), opts);
        if in_memory {
            // Recycling the only connection would drop the database with it.
            o = o.idle_timeout(None).max_lifetime(None);
        }
        let o = o.after_connect(move |conn, _meta| {
            let journal_mode = journal_mode.clone();
            let synchronous = synchronous.clone();
            Box::pin(async move {
                // Values were whitelisted in extract_sqlite_pragmas.
                sqlx::query(&format!("PRAGMA journal_mode = {journal_mode}"))
                    .execute(&mut *conn)
                    .await?;
                sqlx::query(&format!("PRAGMA synchronous = {synchronous}"))
                    .execute(&mut *conn)
                    .await?;
                sqlx::query("PRAGMA foreign_keys = ON")
                    .execute(&mut *conn)
                    .await?;
                if !in_memory {
                    sqlx::query(&format!("PRAGMA busy_timeout = {busy_timeout}"))
                        .execute(&mut *conn)
                        .await?;
                }
                Ok(())
            })
        });

        let pool = o.connect(&clean_dsn).await?;
        tracing::info!(engine = "sqlite", in_memory, "database pool ready");

        #[cfg(feature = "sea-orm")]
        let sea = SqlxSqliteConnector::from_sqlx_sqlite_pool(pool.clone());

        Ok(Self {
            engine: DbEngine::Sqlite,
            pool: DbPool::Sqlite(pool),
            dsn: clean_dsn,
            #[cfg(feature = "sea-orm")]
            sea,
        })
    }

    /// Graceful pool close.
    pub async fn close(self) {
        match self.pool {
            #[cfg(feature = "pg")]
            DbPool::Postgres(p) => p.close().await,
            #[cfg(feature = "sqlite")]
            DbPool::Sqlite(p) => p.close().await,
        }
    }

    /// Get the backend.
    pub fn engine(&self) -> DbEngine {
        self.engine
    }

    /// DSN the pool was opened with (PRAGMA parameters removed).
    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    #[cfg(feature = "pg")]
    pub fn sqlx_postgres(&self) -> Option<&PgPool> {
        match self.pool {
            DbPool::Postgres(ref p) => Some(p),
            #[cfg(feature = "sqlite")]
            _ => None,
        }
    }

    #[cfg(feature = "sqlite")]
    pub fn sqlx_sqlite(&self) -> Option<&SqlitePool> {
        match self.pool {
            DbPool::Sqlite(ref p) => Some(p),
            #[cfg(feature = "pg")]
            _ => None,
        }
    }

    /// SeaORM connection (clone; cheap handle).
    #[cfg(feature = "sea-orm")]
    pub fn sea(&self) -> DatabaseConnection {
        self.sea.clone()
    }

    #[cfg(feature = "sea-orm")]
    pub fn seaorm(&self) -> &DatabaseConnection {
        &self.sea
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_detection() {
        assert_eq!(
            DbHandle::detect("sqlite://test.db").unwrap(),
            DbEngine::Sqlite
        );
        assert_eq!(DbHandle::detect("sqlite::memory:").unwrap(), DbEngine::Sqlite);
        assert_eq!(
            DbHandle::detect("postgres://localhost/test").unwrap(),
            DbEngine::Postgres
        );
        assert!(matches!(
            DbHandle::detect("mysql://localhost/test"),
            Err(DbError::UnknownDsn(_))
        ));
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn test_sqlite_memory_connection_keeps_state() -> Result<()> {
        let opts = ConnectOpts {
            max_conns: Some(8),
            ..Default::default()
        };
        let db = DbHandle::connect("sqlite::memory:?synchronous=FULL", opts).await?;
        assert_eq!(db.engine(), DbEngine::Sqlite);
        assert_eq!(db.dsn(), "sqlite::memory:");

        // Pool is pinned to one connection, so the table survives across queries.
        let pool = db.sqlx_sqlite().unwrap();
        sqlx::query("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)")
            .execute(pool)
            .await?;
        sqlx::query("INSERT INTO t (name) VALUES (?)")
            .bind("value")
            .execute(pool)
            .await?;
        let row: (i64, String) = sqlx::query_as("SELECT id, name FROM t WHERE id = 1")
            .fetch_one(pool)
            .await?;
        assert_eq!(row, (1, "value".to_string()));
        Ok(())
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn test_sqlite_file_connection_creates_dirs() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let dsn = absolutize_sqlite_dsn("sqlite://nested/app.db?wal=true", tmp.path());
        let db = DbHandle::connect(&dsn, ConnectOpts::default()).await?;

        let pool = db.sqlx_sqlite().unwrap();
        let (mode,): (String,) = sqlx::query_as("PRAGMA journal_mode").fetch_one(pool).await?;
        assert_eq!(mode.to_ascii_lowercase(), "wal");
        assert!(tmp.path().join("nested/app.db").exists());
        db.close().await;
        Ok(())
    }

    #[cfg(all(feature = "sea-orm", feature = "sqlite"))]
    #[tokio::test]
    async fn test_seaorm_connection() -> Result<()> {
        use sea_orm::ConnectionTrait;

        let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default()).await?;
        db.sea()
            .execute_unprepared("CREATE TABLE s (id INTEGER PRIMARY KEY)")
            .await?;
        db.seaorm().execute_unprepared("INSERT INTO s (id) VALUES (1)").await?;
        Ok(())
    }
}
