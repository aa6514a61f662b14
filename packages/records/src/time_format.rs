//! Rendering of record durations for the report.
//!
//! Durations are written as fixed-width `HH:MM:SS:mmm`. Hours are always
//! present (and grow past two digits if needed), and milliseconds are
//! truncated, not rounded, so `125.5` renders as `00:02:05:500`.

/// Formats `seconds` as `HH:MM:SS:mmm`, or an empty string when absent.
///
/// Non-finite values render as empty. Negative values are clamped to zero.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_duration(seconds: Option<f64>) -> String {
    let Some(seconds) = seconds.filter(|s| s.is_finite()) else {
        return String::new();
    };
    let seconds = seconds.max(0.0);

    let hours = (seconds / 3600.0).floor() as u64;
    let minutes = ((seconds % 3600.0) / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    let millis = (((seconds - seconds.trunc()) * 1000.0) as u64).min(999);

    format!("{hours:02}:{minutes:02}:{secs:02}:{millis:03}")
}
