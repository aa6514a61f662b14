#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared data types for Tempus player record retrieval.
//!
//! The map catalog is consumed as an ordered list of [`MapRecord`]s. Each
//! map lookup ends in a [`FetchOutcome`], and the engine turns every
//! terminal outcome into exactly one [`ResultRow`] (plus a
//! [`FailedMapRow`] when no record was obtained).

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// The in-game class a record was set with.
///
/// Parses case-insensitively from the class name (`"soldier"`) or from
/// the numeric class id used by the Tempus API (`"3"`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum PlayerClass {
    /// Soldier (Tempus class id 3).
    #[strum(to_string = "Soldier", serialize = "3")]
    Soldier,
    /// Demoman (Tempus class id 4).
    #[strum(to_string = "Demoman", serialize = "4")]
    Demoman,
}

impl PlayerClass {
    /// Numeric class id used in record endpoint paths.
    #[must_use]
    pub const fn class_id(self) -> u8 {
        match self {
            Self::Soldier => 3,
            Self::Demoman => 4,
        }
    }

    /// File name of the pre-fetched map catalog for this class.
    #[must_use]
    pub const fn default_catalog_file(self) -> &'static str {
        match self {
            Self::Soldier => "all_maps_soldier_info.csv",
            Self::Demoman => "all_maps_demoman_info.csv",
        }
    }
}

/// A single map from the catalog, already filtered to one class.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MapRecord {
    /// Tempus map id.
    pub map_id: i64,
    /// Map name (e.g. `"jump_beef"`).
    pub map_name: String,
    /// Difficulty tier for the selected class, passed through untouched.
    pub tier: Option<String>,
    /// Rating for the selected class, passed through untouched.
    pub rating: Option<String>,
}

/// Outcome of looking up one map's record.
///
/// [`Self::RateLimited`] and [`Self::TransportError`] are transient and only
/// ever seen inside the fetcher's retry loop. Every other variant is
/// terminal.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The player has a record on this map. Either field may be missing.
    Success {
        /// Completion time in seconds.
        duration: Option<f64>,
        /// Leaderboard position.
        rank: Option<i64>,
    },
    /// HTTP 404, or a 2xx response with no result payload.
    NotFound,
    /// HTTP 429.
    RateLimited,
    /// Timeout, connection failure, unexpected status, or unreadable body.
    TransportError {
        /// Human-readable cause.
        message: String,
    },
    /// Every attempt ended in a transient failure.
    RetriesExhausted,
}

impl FetchOutcome {
    /// Whether this outcome ends the retry loop.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Success { .. } | Self::NotFound | Self::RetriesExhausted
        )
    }

    /// Completion time carried by a [`Self::Success`].
    #[must_use]
    pub const fn duration(&self) -> Option<f64> {
        match self {
            Self::Success { duration, .. } => *duration,
            _ => None,
        }
    }

    /// Rank carried by a [`Self::Success`].
    #[must_use]
    pub const fn rank(&self) -> Option<i64> {
        match self {
            Self::Success { rank, .. } => *rank,
            _ => None,
        }
    }

    /// `true` when the outcome carries a duration or a rank.
    ///
    /// A map whose outcome has no record is reported as failed.
    #[must_use]
    pub const fn has_record(&self) -> bool {
        self.duration().is_some() || self.rank().is_some()
    }
}

/// One line of the player report.
///
/// Serializes to the results file columns
/// `map_name;class;tier;rating;player_time_formatted;player_rank`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    /// Map id of the source [`MapRecord`]. Not written to the report.
    #[serde(skip)]
    pub map_id: i64,
    /// Map name.
    pub map_name: String,
    /// Display name of the class the lookup was made for.
    #[serde(rename = "class")]
    pub class_name: String,
    /// Tier from the catalog.
    pub tier: Option<String>,
    /// Rating from the catalog.
    pub rating: Option<String>,
    /// Formatted completion time, empty when no duration was returned.
    #[serde(rename = "player_time_formatted")]
    pub formatted_time: String,
    /// Leaderboard position, if any.
    #[serde(rename = "player_rank")]
    pub rank: Option<i64>,
}

impl ResultRow {
    /// `true` when neither a time nor a rank was obtained.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.formatted_time.is_empty() && self.rank.is_none()
    }
}

/// A map for which no record could be obtained.
///
/// Serializes in catalog column form (`map_id;map_name;tier;rating`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedMapRow {
    /// Tempus map id.
    pub map_id: i64,
    /// Map name.
    pub map_name: String,
    /// Tier from the catalog.
    pub tier: Option<String>,
    /// Rating from the catalog.
    pub rating: Option<String>,
}

impl From<&MapRecord> for FailedMapRow {
    fn from(map: &MapRecord) -> Self {
        Self {
            map_id: map.map_id,
            map_name: map.map_name.clone(),
            tier: map.tier.clone(),
            rating: map.rating.clone(),
        }
    }
}
