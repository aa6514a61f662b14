//! Engine configuration.
//!
//! [`EngineConfig`] holds every tunable of a fetch run. It can be built in
//! code, or loaded from a TOML file where any omitted key falls back to its
//! default:
//!
//! ```toml
//! base_url = "https://tempus2.xyz/api/v0"
//! max_retries = 5
//! timeout_secs = 15
//! batch_size = 10
//! max_parallel = 10
//! cooldown_ms = 10000
//! cooldown_after_last_batch = true
//! ```
//!
//! A configuration must pass [`EngineConfig::validate`] before any request
//! is issued.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::ConfigError;

/// Default Tempus API root.
pub const DEFAULT_BASE_URL: &str = "https://tempus2.xyz/api/v0";

/// Default number of attempts per map.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Default number of maps per batch.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Default number of lookups in flight at once.
pub const DEFAULT_MAX_PARALLEL: usize = 10;

/// Default pause between batches in milliseconds.
pub const DEFAULT_COOLDOWN_MS: u64 = 10_000;

/// Tunables for a record fetch run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// API root that record paths are appended to.
    pub base_url: String,
    /// Attempts per map before giving up with `RetriesExhausted`.
    pub max_retries: u32,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Maps per batch.
    pub batch_size: usize,
    /// Maximum lookups in flight within a batch.
    pub max_parallel: usize,
    /// Pause after each batch in milliseconds.
    ///
    /// `batch_size = 1`, `max_parallel = 1`, `cooldown_ms = 500` runs one
    /// map at a time with a half-second pause between maps.
    pub cooldown_ms: u64,
    /// Whether the pause also follows the final batch.
    pub cooldown_after_last_batch: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            batch_size: DEFAULT_BATCH_SIZE,
            max_parallel: DEFAULT_MAX_PARALLEL,
            cooldown_ms: DEFAULT_COOLDOWN_MS,
            cooldown_after_last_batch: true,
        }
    }
}

impl EngineConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if the text is not valid TOML, contains
    /// unknown keys, or has values of the wrong type (e.g. a negative retry
    /// count).
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::de::from_str(text)?)
    }

    /// Reads and parses a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Toml`] if it cannot be parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Checks that the configuration can drive a run.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        if self.max_parallel == 0 {
            return Err(ConfigError::InvalidMaxParallel);
        }
        if self.max_retries == 0 {
            return Err(ConfigError::InvalidMaxRetries);
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        reqwest::Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Pause between batches.
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}
