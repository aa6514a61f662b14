//! Access to the Tempus player record endpoint.
//!
//! [`RecordApi`] is the seam between the fetch engine and the network. It
//! issues exactly one request per call and hands back the raw status and
//! body. Classifying that response is the fetcher's job, so tests can
//! swap in scripted implementations without a server.

use std::time::Duration;

use async_trait::async_trait;
use tempus_records_models::PlayerClass;

use crate::{EngineError, RequestError, config::EngineConfig};

/// Status and body of one record lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: reqwest::StatusCode,
    /// Response body as text. May be empty for error statuses.
    pub body: String,
}

impl RawResponse {
    /// Builds a response from its parts.
    #[must_use]
    pub fn new(status: reqwest::StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// One-shot record lookups against the upstream service.
#[async_trait]
pub trait RecordApi: Send + Sync {
    /// Requests the record of `player_id` on `map_id` for `class`.
    ///
    /// Any HTTP status is returned as `Ok`; only failures below the HTTP
    /// layer are errors.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] on timeouts, connection failures, DNS
    /// failures, or when the body cannot be read.
    async fn get_player_record(
        &self,
        map_id: i64,
        player_id: u64,
        class: PlayerClass,
    ) -> Result<RawResponse, RequestError>;
}

/// Path of a player's record on a map, relative to the API root.
#[must_use]
pub fn record_path(map_id: i64, player_id: u64, class: PlayerClass) -> String {
    format!(
        "/maps/id/{map_id}/zones/typeindex/map/1/records/player/{player_id}/{}",
        class.class_id()
    )
}

/// [`RecordApi`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpRecordApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRecordApi {
    /// Creates a client for `base_url` whose requests time out after
    /// `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`reqwest::Error`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Creates a client from a validated [`EngineConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the configuration is invalid or the HTTP
    /// client cannot be built.
    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self::new(&config.base_url, config.timeout())?)
    }

    /// Absolute URL of a player's record on a map.
    #[must_use]
    pub fn record_url(&self, map_id: i64, player_id: u64, class: PlayerClass) -> String {
        format!(
            "{}{}",
            self.base_url,
            record_path(map_id, player_id, class)
        )
    }
}

#[async_trait]
impl RecordApi for HttpRecordApi {
    async fn get_player_record(
        &self,
        map_id: i64,
        player_id: u64,
        class: PlayerClass,
    ) -> Result<RawResponse, RequestError> {
        let url = self.record_url(map_id, player_id, class);
        log::debug!("GET {url}");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        Ok(RawResponse { status, body })
    }
}
