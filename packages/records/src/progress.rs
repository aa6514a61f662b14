//! Progress and event reporting for record fetch runs.
//!
//! The engine never writes to a terminal or file. It reports counted
//! progress through [`ProgressCallback`] and human-readable events (retries,
//! per-map completions, batch transitions) through [`EventSink`].
//! Rendering backends (an `indicatif` bar, plain `log` output, a GUI table)
//! live in the crates that choose them.

use std::sync::Arc;

/// Trait for reporting progress from a record fetch run.
///
/// Implementations must be `Send + Sync` so they can be shared across
/// concurrently running fetches via `Arc`.
pub trait ProgressCallback: Send + Sync {
    /// Set the total expected units of work (enables percentage/ETA).
    fn set_total(&self, total: u64);

    /// Advance progress by `delta` units.
    fn inc(&self, delta: u64);

    /// Update the message displayed alongside the progress indicator.
    fn set_message(&self, msg: String);

    /// Mark progress as complete with a final message.
    fn finish(&self, msg: String);
}

/// A no-op implementation of [`ProgressCallback`].
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`] instance for convenient use.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}

/// Receives human-readable events emitted while fetching records.
///
/// `level` conveys severity: rate-limit retries are [`log::Level::Info`],
/// transport retries [`log::Level::Warn`], and maps that ran out of
/// retries [`log::Level::Error`].
pub trait EventSink: Send + Sync {
    /// Handles one event.
    fn event(&self, level: log::Level, message: String);
}

/// Forwards every event to the `log` facade at the event's level.
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn event(&self, level: log::Level, message: String) {
        log::log!(level, "{message}");
    }
}

/// Returns a shared [`LogEventSink`].
#[must_use]
pub fn log_events() -> Arc<dyn EventSink> {
    Arc::new(LogEventSink)
}
