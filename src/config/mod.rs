//! Configuration module for the cleanup service.
//!
//! The service is configured via a TOML file, with support for environment
//! variable interpolation using `${VAR_NAME}` syntax.
//!
//! # Example
//!
//! ```toml
//! [database]
//! type = "sqlite"
//! path = "custodian.db"
//!
//! [cleanup]
//! reminder_windows = [7, 3, 1, 0]
//! trigger_secret = "${CLEANUP_TRIGGER_SECRET}"
//!
//! [email]
//! api_key = "${RESEND_API_KEY}"
//! from = "Custodian <no-reply@example.com>"
//! ```

mod billing;
mod cleanup;
mod database;
mod email;
mod observability;
mod server;

use std::path::Path;

pub use billing::*;
pub use cleanup::*;
pub use database::*;
pub use email::*;
pub use observability::*;
use serde::{Deserialize, Serialize};
pub use server::*;

/// Root configuration for the cleanup service.
///
/// All sections except `database` are optional with sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration for persistent storage.
    /// Required: the cleanup pipeline is driven entirely by persisted state.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Cleanup pipeline configuration (reminder windows, trigger secret, ...).
    #[serde(default)]
    pub cleanup: CleanupConfig,

    /// Transactional email transport configuration.
    #[serde(default)]
    pub email: EmailConfig,

    /// Billing provider configuration.
    #[serde(default)]
    pub billing: BillingConfig,

    /// Observability configuration (logging).
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    ///
    /// Environment variables in the format `${VAR_NAME}` are expanded.
    /// Missing required variables will cause an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e, path.as_ref().to_path_buf()))?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(contents)?;
        let config: EngineConfig = toml::from_str(&expanded).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for consistency and completeness.
    fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;
        self.cleanup.validate()?;
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {1}: {0}")]
    Io(std::io::Error, std::path::PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

/// Expand environment variables in the format `${VAR_NAME}`.
/// Skips commented lines (lines where content before the variable is a comment).
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();
    let mut result = String::with_capacity(input.len());

    for line in input.lines() {
        let comment_pos = line.find('#');

        let mut line_result = String::with_capacity(line.len());
        let mut last_end = 0;

        for cap in re.captures_iter(line) {
            let match_start = cap.get(0).unwrap().start();

            // Skip if this variable is inside a comment
            if let Some(pos) = comment_pos
                && match_start >= pos
            {
                continue;
            }

            line_result.push_str(&line[last_end..match_start]);

            let var_name = &cap[1];
            let value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;
            line_result.push_str(&value);

            last_end = cap.get(0).unwrap().end();
        }

        line_result.push_str(&line[last_end..]);
        result.push_str(&line_result);
        result.push('\n');
    }

    // Remove trailing newline if input didn't have one
    if !input.ends_with('\n') && result.ends_with('\n') {
        result.pop();
    }

    Ok(result)
}
