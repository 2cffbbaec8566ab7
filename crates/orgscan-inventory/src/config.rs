//! Inventory configuration
//!
//! Built-in defaults are embedded at compile time. A user file is merged over
//! them: tables merge key by key, arrays and scalars replace the default.

use std::time::Duration;

use orgscan_exec::RateLimit;
use serde::{Deserialize, Serialize};

use crate::catalog::ProbeCatalog;
use crate::error::InventoryError;

/// Embedded default configuration
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Top-level inventory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// REST connection settings
    pub connection: ConnectionConfig,
    /// Retry and concurrency settings
    pub performance: PerformanceConfig,
    /// Request limiting
    #[serde(default)]
    pub security: SecurityConfig,
    /// Log settings
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Capability probes
    pub detection: ProbeCatalog,
}

/// REST connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// REST API version, without the leading `v`
    pub api_version: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl ConnectionConfig {
    /// Request timeout as a duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Retry and concurrency settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Maximum number of object probes in flight
    pub batch_size: usize,
    /// Attempts per remote call
    pub retry_attempts: u32,
    /// Base backoff in milliseconds, multiplied by the attempt number
    pub retry_delay_ms: u64,
}

/// Request limiting
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Request budget per window
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// Request budget, switched off with `enabled = false`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Whether requests are limited at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Requests allowed per window
    pub requests: u32,
    /// Window length in milliseconds
    pub window_ms: u64,
}

impl RateLimitConfig {
    /// Limit to apply, or `None` when disabled
    #[must_use]
    pub fn limit(&self) -> Option<RateLimit> {
        self.enabled.then_some(RateLimit {
            requests: self.requests,
            window_ms: self.window_ms,
        })
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        let limit = RateLimit::default();
        Self {
            enabled: true,
            requests: limit.requests,
            window_ms: limit.window_ms,
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// Log settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl InventoryConfig {
    /// Built-in defaults
    ///
    /// # Errors
    /// Returns an error if the embedded defaults are invalid.
    pub fn embedded() -> Result<Self, InventoryError> {
        Self::from_toml_str(DEFAULT_CONFIG)
    }

    /// Parse a complete configuration
    ///
    /// # Errors
    /// Returns `InventoryError::ConfigError` if parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, InventoryError> {
        let config: InventoryConfig =
            toml::from_str(content).map_err(|e| InventoryError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Merge a partial configuration over the built-in defaults
    ///
    /// # Errors
    /// Returns `InventoryError::ConfigError` if either document fails to parse
    /// or the merged result is invalid.
    pub fn with_overrides(content: &str) -> Result<Self, InventoryError> {
        let mut base: toml::Table = DEFAULT_CONFIG
            .parse()
            .map_err(|e: toml::de::Error| InventoryError::ConfigError(e.to_string()))?;
        let overlay: toml::Table = content
            .parse()
            .map_err(|e: toml::de::Error| InventoryError::ConfigError(e.to_string()))?;

        merge_tables(&mut base, overlay);

        let config: InventoryConfig = toml::Value::Table(base)
            .try_into()
            .map_err(|e: toml::de::Error| InventoryError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges and the probe catalog
    ///
    /// # Errors
    /// Returns `InventoryError::ConfigError` describing the first invalid value.
    pub fn validate(&self) -> Result<(), InventoryError> {
        if self.performance.retry_attempts == 0 {
            return Err(InventoryError::ConfigError(
                "performance.retry_attempts must be at least 1".to_string(),
            ));
        }
        if self.performance.batch_size == 0 {
            return Err(InventoryError::ConfigError(
                "performance.batch_size must be at least 1".to_string(),
            ));
        }
        if let Some(limit) = self.security.rate_limit.limit()
            && (limit.requests == 0 || limit.window_ms == 0)
        {
            return Err(InventoryError::ConfigError(
                "security.rate_limit requests and window_ms must be positive".to_string(),
            ));
        }
        if self.connection.api_version.trim().is_empty() {
            return Err(InventoryError::ConfigError(
                "connection.api_version must not be empty".to_string(),
            ));
        }
        self.detection.validate()
    }
}

/// Recursively merge `overlay` into `base`
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(incoming) => {
                if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                    merge_tables(existing, incoming);
                } else {
                    base.insert(key, toml::Value::Table(incoming));
                }
            }
            value => {
                base.insert(key, value);
            }
        }
    }
}
