//! Layered configuration
//!
//! Precedence, lowest first: built-in defaults, an optional TOML file, then
//! environment variables (a `.env` file in the working directory is loaded
//! first when present).
//!
//! ```toml
//! [safety]
//! safety_storage_path = "/var/lib/drs/safety"
//! max_zero_results_window_hours = 24
//!
//! [safety.thresholds]
//! fetch_drop_percent = 50.0
//!
//! [versions]
//! versions_storage_path = "/var/lib/drs/versions"
//! max_versions_to_keep = 10
//!
//! [logging]
//! log_level = "info"
//! log_format = "json"
//! ```

use drs_safety::SafetyConfig;
use drs_versions::VersionConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable overriding the safety storage root
pub const ENV_SAFETY_STORAGE_PATH: &str = "SAFETY_STORAGE_PATH";
/// Environment variable overriding the version storage root
pub const ENV_VERSIONS_STORAGE_PATH: &str = "VERSIONS_STORAGE_PATH";
/// Environment variable overriding the reserved minimum-resources setting
pub const ENV_MIN_RESOURCES_THRESHOLD: &str = "MIN_RESOURCES_THRESHOLD";
/// Environment variable overriding the zero-result window
pub const ENV_MAX_ZERO_RESULTS_WINDOW_HOURS: &str = "MAX_ZERO_RESULTS_WINDOW_HOURS";
/// Environment variable overriding version retention
pub const ENV_MAX_VERSIONS_TO_KEEP: &str = "MAX_VERSIONS_TO_KEEP";
/// Environment variable overriding the log filter
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
/// Environment variable overriding the log format
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A value failed to parse or validate
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        /// Setting name (environment variable or config field)
        key: String,
        /// Raw value as given
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// Config file could not be read
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Config file path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`DrConfig`]
    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ConfigError {
    fn invalid(key: &str, value: impl fmt::Display, reason: impl fmt::Display) -> Self {
        Self::Invalid {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event
    #[default]
    Json,
    /// Human-readable lines
    Text,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" | "pretty" | "plain" => Ok(Self::Text),
            other => Err(format!("expected json or text, got {other}")),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `drs_safety=debug,info`
    pub log_level: String,
    /// Output format
    pub log_format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
        }
    }
}

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrConfig {
    /// Safety gate settings
    pub safety: SafetyConfig,
    /// Version history settings
    pub versions: VersionConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl DrConfig {
    /// Default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With both storage roots placed under `root`
    #[inline]
    #[must_use]
    pub fn with_storage_root(mut self, root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        self.safety.safety_storage_path = root.join("safety");
        self.versions.versions_storage_path = root.join("versions");
        self
    }

    /// With safety settings
    #[inline]
    #[must_use]
    pub fn with_safety(mut self, safety: SafetyConfig) -> Self {
        self.safety = safety;
        self
    }

    /// With version settings
    #[inline]
    #[must_use]
    pub fn with_versions(mut self, versions: VersionConfig) -> Self {
        self.versions = versions;
        self
    }

    /// With logging settings
    #[inline]
    #[must_use]
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    /// Defaults overridden by the process environment (and `.env`)
    ///
    /// # Errors
    /// `ConfigError::Invalid` if a variable does not parse or the result
    /// fails validation.
    pub fn from_env() -> ConfigResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by values from `lookup`
    ///
    /// # Errors
    /// Same as [`DrConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        Self::default().apply_env(lookup)
    }

    /// Parse a TOML document; missing keys keep their defaults
    ///
    /// # Errors
    /// - `ConfigError::Toml` on malformed TOML or mistyped values
    /// - `ConfigError::Invalid` if the result fails validation
    pub fn from_toml_str(raw: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load defaults, then `path` if given, then the environment
    ///
    /// # Errors
    /// Any [`ConfigError`].
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        dotenvy::dotenv().ok();
        let base = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&raw)?
            }
            None => Self::default(),
        };
        base.apply_env(|key| std::env::var(key).ok())
    }

    /// Override fields with values found through `lookup`, then validate
    ///
    /// # Errors
    /// Same as [`DrConfig::from_env`].
    pub fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        if let Some(path) = lookup(ENV_SAFETY_STORAGE_PATH) {
            self.safety.safety_storage_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(ENV_VERSIONS_STORAGE_PATH) {
            self.versions.versions_storage_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup(ENV_MIN_RESOURCES_THRESHOLD) {
            self.safety.min_resources_threshold = parse_number(ENV_MIN_RESOURCES_THRESHOLD, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MAX_ZERO_RESULTS_WINDOW_HOURS) {
            self.safety.max_zero_results_window_hours =
                parse_number(ENV_MAX_ZERO_RESULTS_WINDOW_HOURS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MAX_VERSIONS_TO_KEEP) {
            self.versions.max_versions_to_keep = parse_number(ENV_MAX_VERSIONS_TO_KEEP, &raw)?;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.logging.log_level = level;
        }
        if let Some(raw) = lookup(ENV_LOG_FORMAT) {
            self.logging.log_format = raw
                .parse()
                .map_err(|reason: String| ConfigError::invalid(ENV_LOG_FORMAT, &raw, reason))?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Check cross-field constraints
    ///
    /// # Errors
    /// `ConfigError::Invalid` naming the offending setting.
    pub fn validate(&self) -> ConfigResult<()> {
        self.safety
            .thresholds
            .validate()
            .map_err(|e| {
                ConfigError::invalid("safety.thresholds", format!("{:?}", self.safety.thresholds), e)
            })?;
        self.versions.validate().map_err(|e| {
            ConfigError::invalid(
                "versions.max_versions_to_keep",
                self.versions.max_versions_to_keep,
                e,
            )
        })?;
        if self.safety.max_zero_results_window_hours == 0 {
            return Err(ConfigError::invalid(
                "safety.max_zero_results_window_hours",
                0,
                "window must be at least one hour",
            ));
        }
        Ok(())
    }
}

fn parse_number<T>(key: &str, raw: &str) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| ConfigError::invalid(key, raw, e))
}
