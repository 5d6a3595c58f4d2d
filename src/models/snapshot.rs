// SPDX-License-Identifier: MIT

//! Crash-recovery snapshot of an in-progress trip.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// Periodically overwritten record of the single in-progress trip.
///
/// At most one snapshot exists at a time. It is written opportunistically
/// while tracking, deleted the moment a trip ends normally, and otherwise
/// consumed exactly once by the recovery path at startup. It never becomes a
/// `Trip` directly; recovery translates it through finalize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OngoingTripSnapshot {
    /// Start location, if one was known when the trip began
    pub start_location: Option<Coordinate>,
    /// Trip start (UTC)
    pub start_time: DateTime<Utc>,
    /// Route accumulated so far
    pub route: Vec<Coordinate>,
    /// Distance accumulated so far, miles
    pub distance_miles: f64,
    /// Whether the trip was paused when the snapshot was taken
    #[serde(default)]
    pub is_paused: bool,
    /// Cumulative paused time, seconds
    #[serde(default)]
    pub total_paused_secs: i64,
}
