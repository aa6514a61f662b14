//! Single-map record lookup with retry and backoff.
//!
//! Every attempt produces an explicit [`FetchOutcome`]. The retry loop in
//! [`RecordFetcher::fetch`] is a plain counted iteration over those
//! outcomes:
//!
//! - **404**, or a 2xx response without a result payload: `NotFound`, no
//!   retry.
//! - **2xx** with a result: `Success`.
//! - **429**: back off from 6s and retry.
//! - **Any other status**, transport failures, and unreadable bodies: back
//!   off from 2s and retry.
//!
//! After `max_retries` transient failures the map ends as
//! `RetriesExhausted`. Retry notices go to the injected [`EventSink`] only.

use std::sync::Arc;

use tempus_records_models::{FetchOutcome, MapRecord, PlayerClass};

use crate::api::{RawResponse, RecordApi};
use crate::backoff::{self, FailureKind};
use crate::progress::EventSink;

/// Looks up one map's record, retrying transient failures.
///
/// Cheap to share: each [`Self::fetch`] call is independent and may run
/// concurrently with others.
#[derive(Clone)]
pub struct RecordFetcher {
    api: Arc<dyn RecordApi>,
    max_retries: u32,
    events: Arc<dyn EventSink>,
}

impl RecordFetcher {
    /// Creates a fetcher that makes at most `max_retries` attempts per map.
    #[must_use]
    pub fn new(api: Arc<dyn RecordApi>, max_retries: u32, events: Arc<dyn EventSink>) -> Self {
        Self {
            api,
            max_retries,
            events,
        }
    }

    /// Replaces the event sink.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Fetches the record for `map`, returning a terminal outcome.
    ///
    /// The result is always one of `Success`, `NotFound`, or
    /// `RetriesExhausted`.
    pub async fn fetch(
        &self,
        map: &MapRecord,
        player_id: u64,
        class: PlayerClass,
    ) -> FetchOutcome {
        for attempt in 0..self.max_retries {
            let outcome = self.attempt(map, player_id, class).await;

            let (kind, level, reason) = match outcome {
                FetchOutcome::RateLimited => (
                    FailureKind::RateLimited,
                    log::Level::Info,
                    "Rate limit hit".to_string(),
                ),
                FetchOutcome::TransportError { message } => (
                    FailureKind::TransportError,
                    log::Level::Warn,
                    format!("Error ({message})"),
                ),
                terminal => return terminal,
            };

            // Deliberately no backoff after the last attempt: the map gives
            // up immediately instead of sleeping once more first.
            if attempt + 1 >= self.max_retries {
                self.events.event(
                    level,
                    format!(
                        "{reason} on map {} (attempt {}/{})",
                        map.map_id,
                        attempt + 1,
                        self.max_retries
                    ),
                );
                break;
            }

            let wait = backoff::delay(attempt, kind);
            self.events.event(
                level,
                format!(
                    "{reason} on map {} (attempt {}/{}). Retrying in {}s...",
                    map.map_id,
                    attempt + 1,
                    self.max_retries,
                    wait.as_secs()
                ),
            );
            tokio::time::sleep(wait).await;
        }

        self.events.event(
            log::Level::Error,
            format!(
                "Failed after {} retries for map {} ({})",
                self.max_retries, map.map_id, map.map_name
            ),
        );
        FetchOutcome::RetriesExhausted
    }

    /// Issues one request and classifies its result.
    async fn attempt(&self, map: &MapRecord, player_id: u64, class: PlayerClass) -> FetchOutcome {
        match self
            .api
            .get_player_record(map.map_id, player_id, class)
            .await
        {
            Ok(response) => classify_response(&response),
            Err(e) => FetchOutcome::TransportError {
                message: e.to_string(),
            },
        }
    }
}

/// Maps one HTTP response onto a [`FetchOutcome`].
#[must_use]
pub fn classify_response(response: &RawResponse) -> FetchOutcome {
    let status = response.status;

    if status == reqwest::StatusCode::NOT_FOUND {
        return FetchOutcome::NotFound;
    }
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return FetchOutcome::RateLimited;
    }
    if !status.is_success() {
        return FetchOutcome::TransportError {
            message: format!("HTTP {status}"),
        };
    }

    parse_record_body(&response.body)
}

/// Extracts the record from a 2xx body.
///
/// Anything other than a non-empty `result` object means the player has no
/// time on the map. A body that is not a JSON object is treated as a
/// transport failure so it gets retried.
fn parse_record_body(body: &str) -> FetchOutcome {
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            return FetchOutcome::TransportError {
                message: format!("invalid response body: {e}"),
            };
        }
    };

    let Some(envelope) = value.as_object() else {
        return FetchOutcome::TransportError {
            message: "response body is not a JSON object".to_string(),
        };
    };

    let Some(result) = envelope
        .get("result")
        .and_then(serde_json::Value::as_object)
        .filter(|r| !r.is_empty())
    else {
        return FetchOutcome::NotFound;
    };

    FetchOutcome::Success {
        duration: result.get("duration").and_then(serde_json::Value::as_f64),
        rank: result.get("rank").and_then(serde_json::Value::as_i64),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::test_support::{RecordingEvents, Reply, ScriptedApi, assert_elapsed, map};

    fn fetcher(api: &Arc<ScriptedApi>, events: &Arc<RecordingEvents>) -> RecordFetcher {
        RecordFetcher::new(api.clone(), 5, events.clone())
    }

    #[test]
    fn classifies_statuses() {
        use reqwest::StatusCode;

        assert_eq!(
            classify_response(&RawResponse::new(StatusCode::NOT_FOUND, "")),
            FetchOutcome::NotFound
        );
        assert_eq!(
            classify_response(&RawResponse::new(StatusCode::TOO_MANY_REQUESTS, "")),
            FetchOutcome::RateLimited
        );
        assert!(matches!(
            classify_response(&RawResponse::new(StatusCode::BAD_GATEWAY, "")),
            FetchOutcome::TransportError { .. }
        ));
        assert!(matches!(
            classify_response(&RawResponse::new(StatusCode::FORBIDDEN, "")),
            FetchOutcome::TransportError { .. }
        ));
    }

    #[test]
    fn parses_result_payload() {
        let body = r#"{"result": {"duration": 125.5, "rank": 3, "id": 99}}"#;
        assert_eq!(
            parse_record_body(body),
            FetchOutcome::Success {
                duration: Some(125.5),
                rank: Some(3)
            }
        );
    }

    #[test]
    fn partial_result_passes_through() {
        assert_eq!(
            parse_record_body(r#"{"result": {"rank": 12}}"#),
            FetchOutcome::Success {
                duration: None,
                rank: Some(12)
            }
        );
    }

    #[test]
    fn missing_or_empty_result_is_not_found() {
        assert_eq!(parse_record_body("{}"), FetchOutcome::NotFound);
        assert_eq!(parse_record_body(r#"{"result": null}"#), FetchOutcome::NotFound);
        assert_eq!(parse_record_body(r#"{"result": {}}"#), FetchOutcome::NotFound);
    }

    #[test]
    fn garbled_body_is_transient() {
        assert!(matches!(
            parse_record_body("{\"result\": {\"dura"),
            FetchOutcome::TransportError { .. }
        ));
        assert!(matches!(
            parse_record_body("[1, 2]"),
            FetchOutcome::TransportError { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_is_never_retried() {
        let api = Arc::new(ScriptedApi::new().script(2, vec![Reply::Status(404)]));
        let events = Arc::new(RecordingEvents::default());

        let outcome = fetcher(&api, &events)
            .fetch(&map(2), 1, PlayerClass::Soldier)
            .await;

        assert_eq!(outcome, FetchOutcome::NotFound);
        assert_eq!(api.calls(2), 1);
        assert!(events.messages().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_then_success() {
        let api = Arc::new(ScriptedApi::new().script(
            3,
            vec![
                Reply::Status(429),
                Reply::Record {
                    duration: Some(61.0),
                    rank: Some(10),
                },
            ],
        ));
        let events = Arc::new(RecordingEvents::default());
        let start = tokio::time::Instant::now();

        let outcome = fetcher(&api, &events)
            .fetch(&map(3), 1, PlayerClass::Soldier)
            .await;

        assert_eq!(
            outcome,
            FetchOutcome::Success {
                duration: Some(61.0),
                rank: Some(10)
            }
        );
        assert_eq!(api.calls(3), 2);
        assert_elapsed(start, Duration::from_secs(6));

        let recorded = events.entries();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].0, log::Level::Info);
        assert!(recorded[0].1.contains("map 3"));
        assert!(recorded[0].1.contains("6s"));
    }

    #[tokio::test(start_paused = true)]
    async fn transport_errors_back_off_from_two_seconds() {
        let api = Arc::new(ScriptedApi::new().script(
            4,
            vec![
                Reply::Unavailable,
                Reply::Status(503),
                Reply::Body("not json"),
                Reply::Record {
                    duration: Some(10.0),
                    rank: None,
                },
            ],
        ));
        let events = Arc::new(RecordingEvents::default());
        let start = tokio::time::Instant::now();

        let outcome = fetcher(&api, &events)
            .fetch(&map(4), 1, PlayerClass::Demoman)
            .await;

        assert!(outcome.has_record());
        assert_eq!(api.calls(4), 4);
        assert_elapsed(start, Duration::from_secs(2 + 4 + 8));
        assert!(
            events
                .entries()
                .iter()
                .all(|(level, _)| *level == log::Level::Warn)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_rate_limiting_exhausts_retries() {
        let api = Arc::new(ScriptedApi::new().script(7, vec![Reply::Status(429); 5]));
        let events = Arc::new(RecordingEvents::default());
        let start = tokio::time::Instant::now();

        let outcome = fetcher(&api, &events)
            .fetch(&map(7), 1, PlayerClass::Soldier)
            .await;

        assert_eq!(outcome, FetchOutcome::RetriesExhausted);
        assert_eq!(api.calls(7), 5);
        assert_elapsed(start, Duration::from_secs(6 + 12 + 24 + 48));

        let recorded = events.entries();
        assert_eq!(recorded.len(), 6);
        let (level, message) = recorded.last().unwrap();
        assert_eq!(*level, log::Level::Error);
        assert!(message.contains("Failed after 5 retries for map 7"));
    }

    #[tokio::test(start_paused = true)]
    async fn mixed_transient_failures_exhaust_retries() {
        let api = Arc::new(ScriptedApi::new().script(
            8,
            vec![
                Reply::Status(500),
                Reply::Status(429),
                Reply::Unavailable,
                Reply::Status(429),
                Reply::Status(502),
                Reply::Record {
                    duration: Some(1.0),
                    rank: Some(1),
                },
            ],
        ));
        let events = Arc::new(RecordingEvents::default());

        let outcome = fetcher(&api, &events)
            .fetch(&map(8), 1, PlayerClass::Soldier)
            .await;

        assert_eq!(outcome, FetchOutcome::RetriesExhausted);
        assert_eq!(api.calls(8), 5);
    }
}
