// SPDX-License-Identifier: MIT

use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};

use roadlog::config::TrackerConfig;
use roadlog::db::TripStore;
use roadlog::geo::Coordinate;
use roadlog::services::notify::Notifier;
use roadlog::services::tracker::TripTracker;
use roadlog::services::Fix;

/// Notifier that records every posted message for assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    #[allow(dead_code)]
    pub fn titles(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .map(|(title, _)| title.clone())
            .collect()
    }

    #[allow(dead_code)]
    pub fn count_title(&self, title: &str) -> usize {
        self.titles().iter().filter(|t| *t == title).count()
    }
}

impl Notifier for RecordingNotifier {
    fn post(&self, title: &str, body: &str) {
        self.messages
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
    }
}

/// Fixed reference time for deterministic scenarios.
#[allow(dead_code)]
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
}

/// Tracker over an in-memory store with a recording notifier.
#[allow(dead_code)]
pub fn test_tracker(config: TrackerConfig) -> (TripTracker, TripStore, Arc<RecordingNotifier>) {
    let store = TripStore::in_memory();
    let notifier = Arc::new(RecordingNotifier::default());
    let tracker = TripTracker::new(config, store.clone(), notifier.clone());
    (tracker, store, notifier)
}

#[allow(dead_code)]
pub fn fix(lat: f64, lon: f64, speed_mps: f64, at: DateTime<Utc>) -> Fix {
    Fix::new(Coordinate::new(lat, lon), speed_mps, at)
}

/// A coordinate roughly `miles` north of `from` (1 degree latitude is about
/// 69 miles).
#[allow(dead_code)]
pub fn north_of(from: Coordinate, miles: f64) -> Coordinate {
    Coordinate::new(from.latitude + miles / 69.0, from.longitude)
}
