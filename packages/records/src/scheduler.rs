//! Batched, bounded-concurrency record retrieval.
//!
//! The catalog is split into consecutive batches. Within a batch up to
//! `max_parallel` lookups are in flight at once and each result is
//! aggregated the moment it completes. Batches run strictly one after the
//! other, separated by a fixed cooldown that keeps the aggregate request
//! rate under the upstream's limit regardless of whether any 429s were
//! seen.
//!
//! All lookups of a batch are polled from one [`FuturesUnordered`] set, so
//! the consuming loop is the only writer to the [`ResultAggregator`]. Each
//! lookup's backoff sleep is local to its own future and never stalls the
//! others.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::StreamExt as _;
use futures::stream::FuturesUnordered;
use tempus_records_models::{FetchOutcome, MapRecord, PlayerClass};

use crate::ConfigError;
use crate::aggregator::{ResultAggregator, RunSummary};
use crate::api::RecordApi;
use crate::config::EngineConfig;
use crate::fetcher::RecordFetcher;
use crate::progress::{EventSink, ProgressCallback, log_events, null_progress};

/// Shared flag asking a run to stop after its in-flight lookups.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of a whole run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Aggregated rows and counts.
    pub summary: RunSummary,
    /// `true` if the run stopped early because of a cancellation request.
    pub cancelled: bool,
    /// When the first batch was dispatched.
    pub started_at: DateTime<Utc>,
    /// When the last result was aggregated (or the final cooldown ended).
    pub finished_at: DateTime<Utc>,
}

/// Drives the [`RecordFetcher`] over a catalog in cooled-down batches.
pub struct BatchScheduler {
    fetcher: RecordFetcher,
    batch_size: usize,
    max_parallel: usize,
    cooldown: Duration,
    cooldown_after_last_batch: bool,
    events: Arc<dyn EventSink>,
    progress: Arc<dyn ProgressCallback>,
    cancel: CancellationFlag,
}

impl BatchScheduler {
    /// Creates a scheduler issuing requests through `api`.
    ///
    /// Events go to the `log` facade and progress is discarded until
    /// replaced with [`Self::with_events`] / [`Self::with_progress`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` fails validation.
    pub fn new(api: Arc<dyn RecordApi>, config: &EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let events = log_events();
        Ok(Self {
            fetcher: RecordFetcher::new(api, config.max_retries, events.clone()),
            batch_size: config.batch_size,
            max_parallel: config.max_parallel,
            cooldown: config.cooldown(),
            cooldown_after_last_batch: config.cooldown_after_last_batch,
            events,
            progress: null_progress(),
            cancel: CancellationFlag::new(),
        })
    }

    /// Sends retry, completion, and batch events to `events`.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.fetcher = self.fetcher.with_events(events.clone());
        self.events = events;
        self
    }

    /// Reports per-map progress to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    /// Observes `cancel` between batches and after every completion.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Handle to this scheduler's cancellation flag.
    #[must_use]
    pub fn cancellation(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    /// Fetches the record of `player_id` for `class` on every map.
    ///
    /// Never fails: per-map failures end up in the summary's failed set.
    /// On cancellation, lookups already in flight still complete and are
    /// aggregated. No new lookup, cooldown, or batch starts afterwards.
    pub async fn run(&self, maps: &[MapRecord], player_id: u64, class: PlayerClass) -> RunReport {
        let started_at = Utc::now();
        let class_name = class.to_string();
        let batch_count = maps.len().div_ceil(self.batch_size);
        let mut aggregator = ResultAggregator::new();
        let mut cancelled = false;

        self.progress.set_total(maps.len() as u64);
        log::debug!(
            "Fetching {} maps for player {player_id} ({class_name}) in {batch_count} batches",
            maps.len()
        );

        for (index, batch) in maps.chunks(self.batch_size).enumerate() {
            let batch_num = index + 1;

            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            self.events.event(
                log::Level::Info,
                format!(
                    "Processing batch {batch_num}/{batch_count} ({} maps)...",
                    batch.len()
                ),
            );
            self.progress
                .set_message(format!("Batch {batch_num}/{batch_count}"));

            self.run_batch(batch_num, batch, player_id, class, &class_name, &mut aggregator)
                .await;

            if self.cancel.is_cancelled() {
                cancelled = true;
                self.events.event(
                    log::Level::Warn,
                    format!(
                        "Cancelled after batch {batch_num}/{batch_count} ({} of {} maps processed)",
                        aggregator.len(),
                        maps.len()
                    ),
                );
                break;
            }

            if batch_num == batch_count && !self.cooldown_after_last_batch {
                break;
            }

            self.events.event(
                log::Level::Info,
                format!(
                    "Cooling down for {} seconds to avoid rate limiting...",
                    self.cooldown.as_secs_f64()
                ),
            );
            tokio::time::sleep(self.cooldown).await;
        }

        let summary = aggregator.summary();
        self.progress.finish(format!(
            "{} with a record, {} without",
            summary.success_count, summary.failed_count
        ));

        RunReport {
            summary,
            cancelled,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Runs one batch, keeping at most `max_parallel` lookups in flight.
    async fn run_batch(
        &self,
        batch_num: usize,
        batch: &[MapRecord],
        player_id: u64,
        class: PlayerClass,
        class_name: &str,
        aggregator: &mut ResultAggregator,
    ) {
        let mut pending = batch.iter();
        let mut in_flight = FuturesUnordered::new();

        for map in pending.by_ref().take(self.max_parallel) {
            in_flight.push(self.fetch_one(map, player_id, class));
        }

        while let Some((map, outcome)) = in_flight.next().await {
            aggregator.add(map, class_name, &outcome);
            self.progress.inc(1);
            self.report_completion(batch_num, map, &outcome);

            if self.cancel.is_cancelled() {
                continue;
            }
            if let Some(next) = pending.next() {
                in_flight.push(self.fetch_one(next, player_id, class));
            }
        }
    }

    async fn fetch_one<'a>(
        &self,
        map: &'a MapRecord,
        player_id: u64,
        class: PlayerClass,
    ) -> (&'a MapRecord, FetchOutcome) {
        let outcome = self.fetcher.fetch(map, player_id, class).await;
        (map, outcome)
    }

    fn report_completion(&self, batch_num: usize, map: &MapRecord, outcome: &FetchOutcome) {
        let message = if outcome.has_record() {
            format!(
                "[Batch {batch_num}] {} - Time: {}, Rank: {}",
                map.map_name,
                crate::time_format::format_duration(outcome.duration()),
                outcome
                    .rank()
                    .map_or_else(|| "-".to_string(), |r| r.to_string())
            )
        } else {
            format!("[Batch {batch_num}] {} - no record", map.map_name)
        };
        self.events.event(log::Level::Info, message);
    }
}
