//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Vote tallying configuration.
    #[serde(default)]
    pub voting: VotingConfig,
    /// Poll creation limits.
    #[serde(default)]
    pub polls: PollsConfig,
    /// Comment limits.
    #[serde(default)]
    pub comments: CommentsConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Vote tallying configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct VotingConfig {
    /// Read-compute-write attempts before a vote fails with a conflict.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

/// Poll creation limits.
#[derive(Debug, Clone, Deserialize)]
pub struct PollsConfig {
    /// Maximum number of choices per poll.
    #[serde(default = "default_max_choices")]
    pub max_choices: usize,
    /// Maximum length of a single choice text, in characters.
    #[serde(default = "default_max_choice_length")]
    pub max_choice_length: usize,
}

/// Comment limits.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentsConfig {
    /// Maximum comment length, in characters.
    #[serde(default = "default_max_content_length")]
    pub max_content_length: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter directives used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_max_choices() -> usize {
    10
}

const fn default_max_choice_length() -> usize {
    100
}

const fn default_max_content_length() -> usize {
    10_000
}

fn default_log_filter() -> String {
    "pollhub=info,sea_orm=warn".to_string()
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
        }
    }
}

impl Default for PollsConfig {
    fn default() -> Self {
        Self {
            max_choices: default_max_choices(),
            max_choice_length: default_max_choice_length(),
        }
    }
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            max_content_length: default_max_content_length(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present, exported into the process environment)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `POLLHUB_ENV`)
    /// 4. Environment variables with `POLLHUB__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("POLLHUB_ENV").unwrap_or_else(|_| "development".to_string());
        tracing::debug!(environment = %env, "Loading configuration");

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("POLLHUB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("POLLHUB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_applied() {
        let file = write_config(
            r#"
            [database]
            url = "postgres://localhost/pollhub"
            "#,
        );

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.database.min_connections, 2);
        assert_eq!(config.voting.max_attempts, 3);
        assert_eq!(config.polls.max_choices, 10);
        assert_eq!(config.polls.max_choice_length, 100);
        assert_eq!(config.comments.max_content_length, 10_000);
        assert!(!config.logging.json);
    }

    #[test]
    fn test_overrides() {
        let file = write_config(
            r#"
            [database]
            url = "postgres://db/pollhub"
            max_connections = 50

            [voting]
            max_attempts = 5

            [logging]
            filter = "pollhub=debug"
            json = true
            "#,
        );

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.database.url, "postgres://db/pollhub");
        assert_eq!(config.database.max_connections, 50);
        assert_eq!(config.voting.max_attempts, 5);
        assert_eq!(config.logging.filter, "pollhub=debug");
        assert!(config.logging.json);
    }

    #[test]
    fn test_missing_database_url_is_error() {
        let file = write_config("[voting]\nmax_attempts = 2\n");
        assert!(Config::from_file(file.path()).is_err());
    }
}
