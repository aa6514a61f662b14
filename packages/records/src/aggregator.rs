//! Accumulation of per-map outcomes into the final report.

use tempus_records_models::{FailedMapRow, FetchOutcome, MapRecord, ResultRow};

use crate::time_format::format_duration;

/// Rows collected over a run, with derived counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// One row per processed map, in aggregation order.
    pub results: Vec<ResultRow>,
    /// Maps for which no record was obtained, in aggregation order.
    pub failed: Vec<FailedMapRow>,
    /// Rows carrying a time or a rank.
    pub success_count: usize,
    /// Rows carrying neither.
    pub failed_count: usize,
}

/// Collects result and failure rows as outcomes arrive.
///
/// Not synchronized. The scheduler owns the aggregator and feeds it from a
/// single consuming loop while lookups run concurrently.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    results: Vec<ResultRow>,
    failed: Vec<FailedMapRow>,
}

impl ResultAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the terminal `outcome` for `map`.
    ///
    /// Outcomes without a time or a rank (`NotFound`, `RetriesExhausted`, or
    /// an empty `Success`) also land in the failed set. Transient outcomes
    /// should never get here; if one does it is counted as failed.
    pub fn add(&mut self, map: &MapRecord, class_name: &str, outcome: &FetchOutcome) {
        if !outcome.is_terminal() {
            log::debug!(
                "Non-terminal outcome {outcome:?} for map {} recorded as failed",
                map.map_id
            );
        }

        self.results.push(ResultRow {
            map_id: map.map_id,
            map_name: map.map_name.clone(),
            class_name: class_name.to_string(),
            tier: map.tier.clone(),
            rating: map.rating.clone(),
            formatted_time: format_duration(outcome.duration()),
            rank: outcome.rank(),
        });

        if !outcome.has_record() {
            self.failed.push(FailedMapRow::from(map));
        }
    }

    /// Number of rows recorded so far.
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.results.len()
    }

    /// Consumes the aggregator and returns the collected rows and counts.
    #[must_use]
    pub fn summary(self) -> RunSummary {
        let failed_count = self.failed.len();
        let success_count = self.results.len() - failed_count;

        RunSummary {
            results: self.results,
            failed: self.failed,
            success_count,
            failed_count,
        }
    }
}
