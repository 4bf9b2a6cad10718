use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Database configuration.
///
/// The database stores the account/subscription records the cleanup pipeline
/// scans and the reminder ledger that makes the reminder phase idempotent.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
#[serde(deny_unknown_fields)]
pub enum DatabaseConfig {
    /// No database configured. Only valid while assembling a config by hand;
    /// rejected by validation since the pipeline is driven by persisted state.
    #[default]
    None,

    /// SQLite database.
    Sqlite(SqliteConfig),
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            DatabaseConfig::None => Err(ConfigError::Validation(
                "the cleanup engine requires a [database] configuration".into(),
            )),
            DatabaseConfig::Sqlite(c) => c.validate(),
        }
    }
}

/// SQLite configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteConfig {
    /// Path to the SQLite database file.
    /// Use `:memory:` for an in-memory database (testing only).
    pub path: String,

    /// Create the database file if it doesn't exist.
    #[serde(default = "default_true")]
    pub create_if_missing: bool,

    /// Run migrations on startup.
    #[serde(default = "default_true")]
    pub run_migrations: bool,

    /// Enable WAL mode for better concurrency.
    #[serde(default = "default_true")]
    pub wal_mode: bool,

    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,

    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl SqliteConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.path.is_empty() {
            return Err(ConfigError::Validation(
                "SQLite path cannot be empty".into(),
            ));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_busy_timeout() -> u64 {
    5000 // 5 seconds
}

fn default_max_connections() -> u32 {
    5
}
