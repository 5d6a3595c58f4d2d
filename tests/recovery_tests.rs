// SPDX-License-Identifier: MIT

//! Crash-recovery scenarios: snapshot consumption, the noise threshold, GPS
//! glitch filtering, and the double-recovery guard.

mod common;

use std::sync::Arc;

use chrono::Duration;

use common::{north_of, t0, test_tracker};
use roadlog::config::TrackerConfig;
use roadlog::db::{keys, MemoryBackend, StorageBackend, TripStore};
use roadlog::geo::Coordinate;
use roadlog::models::OngoingTripSnapshot;
use roadlog::services::notify::NullNotifier;
use roadlog::services::tracker::TripTracker;

const ORIGIN: Coordinate = Coordinate {
    latitude: 37.0,
    longitude: -122.0,
};

fn snapshot_with_route(route: Vec<Coordinate>) -> OngoingTripSnapshot {
    OngoingTripSnapshot {
        start_location: route.first().copied(),
        start_time: t0(),
        route,
        distance_miles: 0.0, // recovery recomputes from the route
        is_paused: false,
        total_paused_secs: 0,
    }
}

/// A route of evenly spaced points totaling roughly `miles`.
fn route_of_miles(miles: f64, points: usize) -> Vec<Coordinate> {
    let step = miles / (points - 1) as f64;
    (0..points)
        .map(|i| north_of(ORIGIN, step * i as f64))
        .collect()
}

#[test]
fn test_recovery_produces_recovered_trip() {
    let (mut tracker, store, notifier) = test_tracker(TrackerConfig::default());
    store
        .save_snapshot(&snapshot_with_route(route_of_miles(5.0, 6)))
        .unwrap();

    let trip = tracker
        .recover_if_present(t0() + Duration::hours(1), None)
        .expect("snapshot above threshold recovers");

    assert!(trip.is_recovered);
    assert_eq!(trip.start_time, t0());
    assert!((trip.distance_miles - 5.0).abs() < 0.1);
    assert_eq!(trip.route.len(), 6);
    assert_eq!(trip.end_coordinate, trip.route.last().copied());

    // Trip persisted, snapshot consumed, user told.
    assert_eq!(store.load_trips().len(), 1);
    assert!(store.load_snapshot().is_none());
    assert_eq!(notifier.count_title("Trip recovered"), 1);
}

#[test]
fn test_recovery_is_idempotent() {
    let (mut tracker, store, _notifier) = test_tracker(TrackerConfig::default());
    let snapshot = snapshot_with_route(route_of_miles(2.0, 4));
    store.save_snapshot(&snapshot).unwrap();

    assert!(tracker.recover_if_present(t0() + Duration::hours(1), None).is_some());
    // Snapshot is gone: nothing to recover.
    assert!(tracker.recover_if_present(t0() + Duration::hours(1), None).is_none());

    // Even if the snapshot survives (process died before the clear), the
    // recovered trip in the store blocks a second recovery.
    store.save_snapshot(&snapshot).unwrap();
    assert!(tracker.recover_if_present(t0() + Duration::hours(2), None).is_none());

    assert_eq!(store.load_trips().len(), 1);
    assert!(store.load_snapshot().is_none());
}

#[test]
fn test_tiny_snapshot_discarded_as_noise() {
    let (mut tracker, store, notifier) = test_tracker(TrackerConfig::default());
    // ~0.03 miles of route: below the 0.1 mile recovery threshold.
    store
        .save_snapshot(&snapshot_with_route(route_of_miles(0.03, 3)))
        .unwrap();

    assert!(tracker.recover_if_present(t0() + Duration::hours(1), None).is_none());
    assert!(store.load_trips().is_empty());
    // Discard still consumes the snapshot, silently.
    assert!(store.load_snapshot().is_none());
    assert_eq!(notifier.count_title("Trip recovered"), 0);
}

#[test]
fn test_small_but_real_snapshot_recovered() {
    let (mut tracker, store, _notifier) = test_tracker(TrackerConfig::default());
    // ~0.2 miles: above the threshold.
    store
        .save_snapshot(&snapshot_with_route(route_of_miles(0.2, 3)))
        .unwrap();

    let trip = tracker
        .recover_if_present(t0() + Duration::hours(1), None)
        .expect("0.2 miles recovers");
    assert!(trip.is_recovered);
    assert!(trip.distance_miles > 0.1);
    assert_eq!(store.load_trips().len(), 1);
}

#[test]
fn test_glitch_jump_excluded_from_distance_but_kept_in_route() {
    let (mut tracker, store, _notifier) = test_tracker(TrackerConfig::default());

    // Normal mile, then a ~200 mile jump, then another normal mile.
    let glitch_target = north_of(ORIGIN, 200.0);
    let route = vec![
        ORIGIN,
        north_of(ORIGIN, 1.0),
        glitch_target,
        north_of(glitch_target, 1.0),
    ];
    store.save_snapshot(&snapshot_with_route(route)).unwrap();

    let trip = tracker
        .recover_if_present(t0() + Duration::hours(1), None)
        .expect("route recovers");

    // The 200 mile segment is not in the sum...
    assert!(
        trip.distance_miles < 3.0,
        "glitch segment should be excluded, got {} miles",
        trip.distance_miles
    );
    assert!(trip.distance_miles > 1.9);
    // ...but the offending point stays in the persisted route.
    assert_eq!(trip.route.len(), 4);
    assert_eq!(store.load_trips()[0].route.len(), 4);
}

#[test]
fn test_recovery_route_invariant_holds_with_current_location() {
    let (mut tracker, store, _notifier) = test_tracker(TrackerConfig::default());

    let a = ORIGIN;
    let b = north_of(ORIGIN, 0.2);
    let snapshot = OngoingTripSnapshot {
        start_location: Some(a),
        start_time: t0(),
        route: vec![a, b],
        distance_miles: 0.2,
        is_paused: false,
        total_paused_secs: 0,
    };
    store.save_snapshot(&snapshot).unwrap();

    let current = north_of(ORIGIN, 0.3);
    let trip = tracker
        .recover_if_present(t0() + Duration::minutes(30), Some(current))
        .expect("recovers");

    // Route already has >= 2 points so it is untouched; the invariant holds.
    assert!(trip.route.len() >= 2);
    assert_eq!(trip.route, vec![a, b]);
    // The known current location still stamps the end coordinate, even though
    // it is not a route point.
    assert_eq!(trip.end_coordinate, Some(current));
}

#[test]
fn test_recovery_end_coordinate_falls_back_to_route_end() {
    let (mut tracker, store, _notifier) = test_tracker(TrackerConfig::default());
    let route = route_of_miles(2.0, 4);
    let last = *route.last().unwrap();
    store.save_snapshot(&snapshot_with_route(route)).unwrap();

    let trip = tracker
        .recover_if_present(t0() + Duration::hours(1), None)
        .expect("recovers");
    assert_eq!(trip.end_coordinate, Some(last));
}

#[test]
fn test_corrupt_snapshot_treated_as_absent() {
    let backend = Arc::new(MemoryBackend::default());
    backend.save(keys::ONGOING_TRIP, b"{definitely not json").unwrap();

    let store = TripStore::new(backend);
    let mut tracker = TripTracker::new(
        TrackerConfig::default(),
        store.clone(),
        Arc::new(NullNotifier),
    );

    // Recovery must not fail at startup on a bad blob.
    assert!(tracker.recover_if_present(t0(), None).is_none());
    assert!(store.load_trips().is_empty());
}

#[test]
fn test_no_snapshot_no_recovery() {
    let (mut tracker, store, _notifier) = test_tracker(TrackerConfig::default());
    assert!(tracker.recover_if_present(t0(), None).is_none());
    assert!(store.load_trips().is_empty());
}
