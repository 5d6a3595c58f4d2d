// SPDX-License-Identifier: MIT

//! Location-service boundary.
//!
//! The platform pushes fixes via delegate callbacks; here that becomes an
//! explicit `tokio::sync::mpsc` channel feeding the single tracker consumer,
//! which preserves event ordering.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::geo::Coordinate;

/// A single reported GPS sample.
#[derive(Debug, Clone, Copy)]
pub struct Fix {
    pub coordinate: Coordinate,
    /// Reported speed in meters/second; negative means the reading is invalid
    pub speed_mps: f64,
    pub timestamp: DateTime<Utc>,
}

impl Fix {
    pub fn new(coordinate: Coordinate, speed_mps: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            coordinate,
            speed_mps,
            timestamp,
        }
    }

    /// Whether the reported speed is usable for the speed observable.
    pub fn has_valid_speed(&self) -> bool {
        self.speed_mps >= 0.0
    }
}

/// The location collaborator the core calls into.
pub trait LocationSource: Send + Sync {
    /// Ask the platform to start delivering fixes.
    fn request_tracking(&self);

    /// Most recent known location, if any.
    fn last_known(&self) -> Option<Coordinate>;
}

/// Channel pair carrying fixes from the platform callback into the runtime.
pub fn fix_channel(capacity: usize) -> (mpsc::Sender<Fix>, mpsc::Receiver<Fix>) {
    mpsc::channel(capacity)
}

/// A [`LocationSource`] with no platform behind it, for tests and replay.
#[derive(Default)]
pub struct NullLocationSource {
    last: std::sync::Mutex<Option<Coordinate>>,
}

impl NullLocationSource {
    pub fn set_last_known(&self, coordinate: Coordinate) {
        *self.last.lock().expect("location lock poisoned") = Some(coordinate);
    }
}

impl LocationSource for NullLocationSource {
    fn request_tracking(&self) {}

    fn last_known(&self) -> Option<Coordinate> {
        *self.last.lock().expect("location lock poisoned")
    }
}
