#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! File collaborators of the record fetch engine.
//!
//! Reads the pre-fetched, class-filtered map catalog ([`catalog`]) and
//! writes the player report and the list of maps without a record
//! ([`report`]). All files are semicolon-delimited with a header row.

pub mod catalog;
pub mod report;

use std::path::PathBuf;

/// Field delimiter shared by the catalog and report files.
pub const DELIMITER: u8 = b';';

/// Errors that can occur while reading or writing record files.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The catalog file does not exist.
    #[error("Catalog file not found: {}", path.display())]
    CatalogNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing or writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
