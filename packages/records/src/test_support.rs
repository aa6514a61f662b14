//! Scripted [`RecordApi`] and recording sinks for engine tests.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tempus_records_models::{MapRecord, PlayerClass};

use crate::RequestError;
use crate::api::{RawResponse, RecordApi};
use crate::progress::{EventSink, ProgressCallback};

/// Builds a catalog entry with predictable name, tier, and rating.
pub fn map(map_id: i64) -> MapRecord {
    MapRecord {
        map_id,
        map_name: format!("jump_test_{map_id}"),
        tier: Some((map_id % 6 + 1).to_string()),
        rating: Some("2".to_string()),
    }
}

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Bare status with an empty body.
    Status(u16),
    /// 200 with a `result` object.
    Record {
        duration: Option<f64>,
        rank: Option<i64>,
    },
    /// 200 with an arbitrary body.
    Body(&'static str),
    /// A failure below the HTTP layer.
    Unavailable,
}

impl Reply {
    fn into_response(self) -> Result<RawResponse, RequestError> {
        let ok = reqwest::StatusCode::OK;
        match self {
            Self::Status(code) => Ok(RawResponse::new(
                reqwest::StatusCode::from_u16(code).expect("valid status code"),
                "",
            )),
            Self::Record { duration, rank } => Ok(RawResponse::new(
                ok,
                serde_json::json!({ "result": { "duration": duration, "rank": rank } })
                    .to_string(),
            )),
            Self::Body(body) => Ok(RawResponse::new(ok, body)),
            Self::Unavailable => Err(RequestError::Unavailable {
                message: "connection reset".to_string(),
            }),
        }
    }
}

/// A [`RecordApi`] that replays per-map scripts.
///
/// Maps without a script, or whose script ran out, answer 404. Every call
/// takes `latency` of (virtual) time so concurrent lookups overlap.
#[derive(Default)]
pub struct ScriptedApi {
    scripts: Mutex<BTreeMap<i64, VecDeque<Reply>>>,
    calls: Mutex<BTreeMap<i64, u32>>,
    latency: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    total_calls: AtomicU64,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, map_id: i64, replies: Vec<Reply>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(map_id, replies.into_iter().collect());
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self, map_id: i64) -> u32 {
        self.calls
            .lock()
            .unwrap()
            .get(&map_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> u64 {
        self.total_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordApi for ScriptedApi {
    async fn get_player_record(
        &self,
        map_id: i64,
        _player_id: u64,
        _class: PlayerClass,
    ) -> Result<RawResponse, RequestError> {
        *self.calls.lock().unwrap().entry(map_id).or_default() += 1;
        self.total_calls.fetch_add(1, Ordering::SeqCst);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let reply = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&map_id)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Reply::Status(404));

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply.into_response()
    }
}

/// Collects every event for later inspection.
#[derive(Default)]
pub struct RecordingEvents {
    entries: Mutex<Vec<(log::Level, String)>>,
}

impl RecordingEvents {
    pub fn entries(&self) -> Vec<(log::Level, String)> {
        self.entries.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries().into_iter().map(|(_, m)| m).collect()
    }
}

impl EventSink for RecordingEvents {
    fn event(&self, level: log::Level, message: String) {
        self.entries.lock().unwrap().push((level, message));
    }
}

/// Counts completions and runs a hook after each one.
pub struct HookProgress<F: Fn(u64) + Send + Sync> {
    done: AtomicU64,
    total: AtomicU64,
    on_inc: F,
}

impl<F: Fn(u64) + Send + Sync> HookProgress<F> {
    pub fn new(on_inc: F) -> Self {
        Self {
            done: AtomicU64::new(0),
            total: AtomicU64::new(0),
            on_inc,
        }
    }

    pub fn done(&self) -> u64 {
        self.done.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }
}

impl<F: Fn(u64) + Send + Sync> ProgressCallback for HookProgress<F> {
    fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::SeqCst);
    }

    fn inc(&self, delta: u64) {
        let done = self.done.fetch_add(delta, Ordering::SeqCst) + delta;
        (self.on_inc)(done);
    }

    fn set_message(&self, _msg: String) {}

    fn finish(&self, _msg: String) {}
}

/// Asserts that (virtual) time elapsed since `start` is `expected`, allowing
/// for the timer wheel's millisecond rounding.
#[track_caller]
pub fn assert_elapsed(start: tokio::time::Instant, expected: Duration) {
    let elapsed = start.elapsed();
    assert!(
        elapsed >= expected && elapsed < expected + Duration::from_millis(50),
        "expected {expected:?} to elapse, got {elapsed:?}"
    );
}
