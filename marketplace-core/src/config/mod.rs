//! Configuration management for the marketplace client
//!
//! Settings come from defaults, an optional TOML file, and `MARKETPLACE_*`
//! environment variables, and are validated before use.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::query::RetryPolicy;

mod error;

pub use error::ConfigError;

/// Main client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend connection settings
    pub gateway: GatewayConfig,

    /// Durable session storage
    pub session: SessionConfig,

    /// Query cache behaviour
    pub query: QueryConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: String,

    /// Whole-request timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// TCP connect timeout
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
}

/// Durable session storage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Directory holding the `session` entry
    pub data_dir: PathBuf,
}

/// Query cache behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Retry policy applied to query fetches (never to mutations)
    pub retry: RetryPolicy,

    /// Items requested per page by paginated lists
    pub page_size: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON formatting
    pub json_format: bool,

    /// Include timestamps
    pub with_timestamp: bool,

    /// Include target module
    pub with_target: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            request_timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { data_dir: PathBuf::from("./data") }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self { retry: RetryPolicy::default(), page_size: 20 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_timestamp: true,
            with_target: true,
        }
    }
}

fn parse_env<T>(name: &str, what: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue(format!("Invalid {}: {}", what, e))),
        Err(_) => Ok(None),
    }
}

fn parse_env_duration(name: &str, what: &str) -> Result<Option<Duration>, ConfigError> {
    match env::var(name) {
        Ok(raw) => humantime::parse_duration(&raw)
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue(format!("Invalid {}: {}", what, e))),
        Err(_) => Ok(None),
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables follow the pattern: MARKETPLACE_<SECTION>_<KEY>
    /// Example: MARKETPLACE_GATEWAY_BASE_URL=https://api.example.com
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn load(path: Option<&std::path::Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::read_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let config = Self::read_file(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::FileReadError(e.to_string()))?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        // Gateway config
        if let Ok(url) = env::var("MARKETPLACE_GATEWAY_BASE_URL") {
            self.gateway.base_url = url;
        }
        if let Some(timeout) =
            parse_env_duration("MARKETPLACE_GATEWAY_REQUEST_TIMEOUT", "request timeout")?
        {
            self.gateway.request_timeout = timeout;
        }
        if let Some(timeout) =
            parse_env_duration("MARKETPLACE_GATEWAY_CONNECT_TIMEOUT", "connect timeout")?
        {
            self.gateway.connect_timeout = timeout;
        }

        // Session config
        if let Ok(data_dir) = env::var("MARKETPLACE_SESSION_DATA_DIR") {
            self.session.data_dir = PathBuf::from(data_dir);
        }

        // Query config
        if let Some(retries) = parse_env("MARKETPLACE_QUERY_MAX_RETRIES", "max retries")? {
            self.query.retry.max_retries = retries;
        }
        if let Some(page_size) = parse_env("MARKETPLACE_QUERY_PAGE_SIZE", "page size")? {
            self.query.page_size = page_size;
        }

        // Logging config
        if let Ok(level) = env::var("MARKETPLACE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = parse_env("MARKETPLACE_LOG_JSON", "JSON flag")? {
            self.logging.json_format = json;
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate gateway config
        let url = reqwest::Url::parse(&self.gateway.base_url).map_err(|e| {
            ConfigError::ValidationFailed(format!("base_url '{}': {}", self.gateway.base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::ValidationFailed(format!(
                "base_url must be http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.gateway.request_timeout.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        // Validate query config
        if self.query.page_size == 0 {
            return Err(ConfigError::ValidationFailed(
                "page_size must be greater than 0".to_string(),
            ));
        }

        if self.query.retry.base_delay > self.query.retry.max_delay {
            return Err(ConfigError::ValidationFailed(
                "retry base_delay must not exceed max_delay".to_string(),
            ));
        }

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationFailed(format!(
                "Invalid log level: {}",
                self.logging.level
            )));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: impl AsRef<std::path::Path>) -> Result<(), ConfigError> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, contents).map_err(|e| ConfigError::FileWriteError(e.to_string()))?;

        Ok(())
    }
}
