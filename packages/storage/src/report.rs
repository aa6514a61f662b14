//! Report writers.
//!
//! The results file has one row per processed map:
//!
//! ```text
//! map_name;class;tier;rating;player_time_formatted;player_rank
//! jump_beef;Soldier;1;1;00:02:05:500;3
//! ```
//!
//! The failed-maps file lists maps without a record in catalog form so it
//! can be fed back in as a catalog for a retry run.

use std::io::Write;
use std::path::Path;

use tempus_records_models::{FailedMapRow, ResultRow};

use crate::{DELIMITER, StorageError};

/// Default results file name.
pub const RESULTS_FILE: &str = "player_map_records.csv";

/// Default failed-maps file name.
pub const FAILED_FILE: &str = "failed_maps.csv";

const RESULT_HEADER: [&str; 6] = [
    "map_name",
    "class",
    "tier",
    "rating",
    "player_time_formatted",
    "player_rank",
];

const FAILED_HEADER: [&str; 4] = ["map_id", "map_name", "tier", "rating"];

// Headers are written explicitly so that an empty report still has one.
fn writer<W: Write>(out: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .from_writer(out)
}

/// Writes result rows, header first.
///
/// # Errors
///
/// Returns [`StorageError`] if writing fails.
pub fn write_results<W: Write>(out: W, rows: &[ResultRow]) -> Result<(), StorageError> {
    let mut csv = writer(out);
    csv.write_record(RESULT_HEADER)?;

    for row in rows {
        csv.serialize(row)?;
    }

    csv.flush()?;
    Ok(())
}

/// Writes failed-map rows, header first.
///
/// # Errors
///
/// Returns [`StorageError`] if writing fails.
pub fn write_failed<W: Write>(out: W, rows: &[FailedMapRow]) -> Result<(), StorageError> {
    let mut csv = writer(out);
    csv.write_record(FAILED_HEADER)?;

    for row in rows {
        csv.serialize(row)?;
    }

    csv.flush()?;
    Ok(())
}

/// Writes the results file at `path`, replacing any existing file.
///
/// # Errors
///
/// Returns [`StorageError`] if the file cannot be created or written.
pub fn save_results(path: &Path, rows: &[ResultRow]) -> Result<(), StorageError> {
    write_results(std::fs::File::create(path)?, rows)?;
    log::info!("Wrote {} result rows to {}", rows.len(), path.display());
    Ok(())
}

/// Writes the failed-maps file at `path`, replacing any existing file.
///
/// # Errors
///
/// Returns [`StorageError`] if the file cannot be created or written.
pub fn save_failed(path: &Path, rows: &[FailedMapRow]) -> Result<(), StorageError> {
    write_failed(std::fs::File::create(path)?, rows)?;
    log::info!("Wrote {} failed maps to {}", rows.len(), path.display());
    Ok(())
}
