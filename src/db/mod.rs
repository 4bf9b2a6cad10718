mod error;
pub mod repos;
pub mod sqlite;


use std::sync::Arc;

pub use error::{DbError, DbResult};
pub use repos::*;

use crate::config::DatabaseConfig;

/// Cached repository trait objects, created once at startup.
struct CachedRepos {
    accounts: Arc<dyn AccountRepo>,
    reminders: Arc<dyn ReminderRepo>,
}

/// SQLite-backed database pool.
///
/// Repositories are cached at construction time to avoid allocation on each access.
pub struct DbPool {
    pool: sqlx::SqlitePool,
    repos: CachedRepos,
}

impl DbPool {
    /// Create a DbPool from an existing SQLite pool.
    /// Primarily useful for testing.
    pub fn from_sqlite(pool: sqlx::SqlitePool) -> Self {
        let repos = CachedRepos {
            accounts: Arc::new(sqlite::SqliteAccountRepo::new(pool.clone())),
            reminders: Arc::new(sqlite::SqliteReminderRepo::new(pool.clone())),
        };
        DbPool { pool, repos }
    }

    /// Create a database pool from configuration
    pub async fn from_config(config: &DatabaseConfig) -> DbResult<Self> {
        match config {
            DatabaseConfig::None => Err(DbError::NotConfigured),
            DatabaseConfig::Sqlite(cfg) => {
                let pool = sqlx::sqlite::SqlitePoolOptions::new()
                    .max_connections(cfg.max_connections)
                    .connect_with(
                        sqlx::sqlite::SqliteConnectOptions::new()
                            .filename(&cfg.path)
                            .create_if_missing(cfg.create_if_missing)
                            .journal_mode(if cfg.wal_mode {
                                sqlx::sqlite::SqliteJournalMode::Wal
                            } else {
                                sqlx::sqlite::SqliteJournalMode::Delete
                            })
                            .busy_timeout(std::time::Duration::from_millis(cfg.busy_timeout_ms)),
                    )
                    .await?;

                Ok(Self::from_sqlite(pool))
            }
        }
    }

    /// Run database migrations using sqlx's migration runner.
    /// This automatically creates and manages a _sqlx_migrations table.
    pub async fn run_migrations(&self) -> DbResult<()> {
        tracing::info!("Running SQLite migrations");
        sqlx::migrate!("./migrations_sqlx/sqlite")
            .run(&self.pool)
            .await?;
        tracing::info!("SQLite migrations completed successfully");
        Ok(())
    }

    /// Get account repository
    pub fn accounts(&self) -> Arc<dyn AccountRepo> {
        Arc::clone(&self.repos.accounts)
    }

    /// Get reminder ledger repository
    pub fn reminders(&self) -> Arc<dyn ReminderRepo> {
        Arc::clone(&self.repos.reminders)
    }

    /// Health check for database connectivity
    pub async fn health_check(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
