//! Configuration for the fitlog binary.
//!
//! Loaded from environment variables with defaults; a `.env` file is read
//! first by the binary.

use crate::selectors::SortColumn;
use crate::types::WorkoutFilter;
use std::time::Duration;
use thiserror::Error;

/// Base URL of the trainings server
pub const API_URL_VAR: &str = "FITLOG_API_URL";
/// Per-request timeout in seconds
pub const REQUEST_TIMEOUT_VAR: &str = "FITLOG_REQUEST_TIMEOUT_SECS";
/// Seconds to wait for running effects on exit
pub const SHUTDOWN_TIMEOUT_VAR: &str = "FITLOG_SHUTDOWN_TIMEOUT_SECS";
/// Log filter directives
pub const LOG_VAR: &str = "FITLOG_LOG";
/// Table filter: `all` or a workout type
pub const FILTER_VAR: &str = "FITLOG_FILTER";
/// Table sort column by field name
pub const SORT_VAR: &str = "FITLOG_SORT";

/// Errors from reading configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but cannot be used
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Variable name
        key: &'static str,
        /// Offending value
        value: String,
    },
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Remote collection settings
    pub api: ApiConfig,
    /// Logging settings
    pub logging: LoggingConfig,
    /// How long to wait for running effects on exit
    pub shutdown_timeout: Duration,
    /// Table settings
    pub view: ViewConfig,
}

/// Remote collection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Server base URL; trainings live under `{base_url}/trainings`
    pub base_url: String,
    /// Per-request timeout; `None` waits indefinitely
    pub request_timeout: Option<Duration>,
}

/// Table settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewConfig {
    /// Initial workout type filter
    pub filter: WorkoutFilter,
    /// Column sorted ascending, if any
    pub sort: Option<SortColumn>,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:3000".to_string(),
                request_timeout: None,
            },
            logging: LoggingConfig {
                filter: "info,fitlog_trainings=debug".to_string(),
            },
            shutdown_timeout: Duration::from_secs(5),
            view: ViewConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a timeout is not a whole
    /// number of seconds or the table filter or sort column is unknown.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Same as [`Config::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            api: ApiConfig {
                base_url: lookup(API_URL_VAR).unwrap_or(defaults.api.base_url),
                request_timeout: lookup(REQUEST_TIMEOUT_VAR)
                    .map(|value| parse_secs(REQUEST_TIMEOUT_VAR, value))
                    .transpose()?,
            },
            logging: LoggingConfig {
                filter: lookup(LOG_VAR).unwrap_or(defaults.logging.filter),
            },
            shutdown_timeout: lookup(SHUTDOWN_TIMEOUT_VAR)
                .map(|value| parse_secs(SHUTDOWN_TIMEOUT_VAR, value))
                .transpose()?
                .unwrap_or(defaults.shutdown_timeout),
            view: ViewConfig {
                filter: lookup(FILTER_VAR)
                    .map(|value| {
                        value
                            .parse()
                            .map_err(|_| ConfigError::InvalidValue { key: FILTER_VAR, value })
                    })
                    .transpose()?
                    .unwrap_or_default(),
                sort: lookup(SORT_VAR)
                    .map(|value| {
                        SortColumn::from_name(&value)
                            .ok_or(ConfigError::InvalidValue { key: SORT_VAR, value })
                    })
                    .transpose()?,
            },
        })
    }
}

fn parse_secs(key: &'static str, value: String) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse()
        .map(Duration::from_secs)
        .map_err(|_| ConfigError::InvalidValue { key, value })
}
