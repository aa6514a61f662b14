#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Concurrent record fetch engine for the Tempus API.
//!
//! Given a map catalog, a player id, and a class, the engine looks up the
//! player's record on every map and classifies each map as found or not:
//!
//! 1. [`scheduler::BatchScheduler`] splits the catalog into batches, runs
//!    each batch with bounded parallelism, and pauses between batches.
//! 2. [`fetcher::RecordFetcher`] performs one map's lookup, retrying 429s
//!    and transport failures with [`backoff`] delays.
//! 3. [`aggregator::ResultAggregator`] turns every terminal outcome into a
//!    report row and tracks which maps yielded no record.
//!
//! Per-map failures never surface as errors. Only an invalid
//! [`config::EngineConfig`] stops a run before it starts.

pub mod aggregator;
pub mod api;
pub mod backoff;
pub mod config;
pub mod fetcher;
pub mod progress;
pub mod scheduler;
pub mod time_format;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use tempus_records_models::{MapRecord, PlayerClass};

use crate::api::HttpRecordApi;
use crate::config::EngineConfig;
use crate::progress::{EventSink, ProgressCallback};
use crate::scheduler::{BatchScheduler, CancellationFlag, RunReport};

/// Invalid engine configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `batch_size` was zero.
    #[error("batch_size must be at least 1")]
    InvalidBatchSize,

    /// `max_parallel` was zero.
    #[error("max_parallel must be at least 1")]
    InvalidMaxParallel,

    /// `max_retries` was zero.
    #[error("max_retries must be at least 1")]
    InvalidMaxRetries,

    /// `timeout_secs` was zero.
    #[error("timeout_secs must be at least 1")]
    InvalidTimeout,

    /// `base_url` could not be parsed.
    #[error("Invalid base URL '{url}': {message}")]
    InvalidBaseUrl {
        /// The rejected value.
        url: String,
        /// Parser error.
        message: String,
    },

    /// The configuration file is not valid TOML for [`EngineConfig`].
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A record request that failed below the HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// `reqwest` failed (timeout, connect, DNS, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream could not be reached for another reason.
    #[error("Upstream unavailable: {message}")]
    Unavailable {
        /// Description of what went wrong.
        message: String,
    },
}

/// Errors that prevent a run from starting.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Fetches the records of `player_id` for `class` on every map in `maps`
/// from the Tempus API described by `config`.
///
/// # Errors
///
/// Returns [`EngineError`] if `config` is invalid or the HTTP client cannot
/// be built. Nothing is fetched in that case.
pub async fn fetch_player_records(
    config: &EngineConfig,
    maps: &[MapRecord],
    player_id: u64,
    class: PlayerClass,
    events: Arc<dyn EventSink>,
    progress: Arc<dyn ProgressCallback>,
    cancel: CancellationFlag,
) -> Result<RunReport, EngineError> {
    let api = Arc::new(HttpRecordApi::from_config(config)?);
    let scheduler = BatchScheduler::new(api, config)?
        .with_events(events)
        .with_progress(progress)
        .with_cancellation(cancel);

    Ok(scheduler.run(maps, player_id, class).await)
}
