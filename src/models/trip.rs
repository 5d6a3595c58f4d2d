// SPDX-License-Identifier: MIT

//! Completed trip record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::Coordinate;

/// A completed (or crash-recovered) drive.
///
/// Created only by the tracker's finalize path and stored immediately on
/// creation. Notes, pay, reason and media references may be edited afterward
/// through `TripStore::update_trip`; everything else is fixed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    /// Unique id, assigned at creation, never reused
    pub id: Uuid,
    /// Trip start (UTC)
    pub start_time: DateTime<Utc>,
    /// Trip end (UTC); always >= start_time
    pub end_time: DateTime<Utc>,
    /// Accumulated distance in miles
    pub distance_miles: f64,
    /// Chronological route; empty or at least 2 points
    pub route: Vec<Coordinate>,
    /// First route point, if known
    pub start_coordinate: Option<Coordinate>,
    /// Last route point, if known
    pub end_coordinate: Option<Coordinate>,
    /// Free-text notes
    #[serde(default)]
    pub notes: String,
    /// Free-text pay/earnings annotation
    #[serde(default)]
    pub pay: String,
    /// Trip category ("Business", "Personal", ...)
    #[serde(default)]
    pub reason: String,
    /// References to externally stored photos; the trip does not own the files
    #[serde(default)]
    pub photo_urls: Vec<String>,
    /// References to externally stored audio notes
    #[serde(default)]
    pub audio_notes: Vec<String>,
    /// True iff reconstructed from a crash-recovery snapshot
    #[serde(default)]
    pub is_recovered: bool,
    /// Average speed in meters/second, when the caller supplied one
    #[serde(default)]
    pub average_speed_mps: Option<f64>,
}

impl Trip {
    /// Trip duration.
    pub fn duration(&self) -> chrono::Duration {
        self.end_time - self.start_time
    }
}
