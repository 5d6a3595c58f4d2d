// SPDX-License-Identifier: MIT

//! End-to-end lifecycle scenarios: start → fixes → pause/resume → finalize,
//! including snapshot writing, store contents, and achievement wiring.

mod common;

use chrono::Duration;

use common::{fix, north_of, t0, test_tracker};
use roadlog::config::TrackerConfig;
use roadlog::db::TripStore;
use roadlog::geo::Coordinate;
use roadlog::services::achievements::AchievementService;
use roadlog::services::tracker::{TripCompletion, TripState};

const CUPERTINO: Coordinate = Coordinate {
    latitude: 37.3346,
    longitude: -122.0090,
};
const GOLDEN_GATE: Coordinate = Coordinate {
    latitude: 37.8199,
    longitude: -122.4783,
};

#[test]
fn test_two_fix_drive_accumulates_expected_distance() {
    let (mut tracker, _store, _notifier) = test_tracker(TrackerConfig::default());

    tracker.start(t0(), None, false);
    tracker.on_fix(fix(CUPERTINO.latitude, CUPERTINO.longitude, 25.0, t0()));
    tracker.on_fix(fix(
        GOLDEN_GATE.latitude,
        GOLDEN_GATE.longitude,
        25.0,
        t0() + Duration::minutes(50),
    ));

    // Great-circle distance Cupertino -> Golden Gate is 42.2 statute miles.
    let distance = tracker.distance_miles();
    assert!(
        (41.5..=43.0).contains(&distance),
        "expected ~42.2 miles, got {distance}"
    );
}

#[test]
fn test_finalized_trip_lands_in_store_newest_first() {
    let (mut tracker, store, _notifier) = test_tracker(TrackerConfig::default());

    tracker.start(t0(), None, false);
    tracker.on_fix(fix(37.0, -122.0, 10.0, t0()));
    tracker.on_fix(fix(37.01, -122.0, 10.0, t0() + Duration::seconds(30)));
    let first = tracker
        .end_trip(t0() + Duration::minutes(5), TripCompletion::default())
        .expect("first trip");

    tracker.start(t0() + Duration::minutes(10), None, false);
    let second = tracker
        .end_trip(t0() + Duration::minutes(15), TripCompletion::default())
        .expect("second trip");

    let trips = store.load_trips();
    assert_eq!(trips.len(), 2);
    assert_eq!(trips[0].id, second.id);
    assert_eq!(trips[1].id, first.id);
    assert!(trips.iter().all(|t| t.end_time >= t.start_time));
}

#[test]
fn test_pause_excludes_distance_and_resume_restores_accrual() {
    let (mut tracker, _store, notifier) = test_tracker(TrackerConfig::default());

    tracker.start(t0(), None, false);
    tracker.on_fix(fix(37.0, -122.0, 10.0, t0()));
    tracker.on_fix(fix(37.01, -122.0, 10.0, t0() + Duration::seconds(30)));
    let tracked = tracker.distance_miles();

    tracker.pause(t0() + Duration::minutes(1));
    assert_eq!(tracker.state(), TripState::Paused);

    // A long detour while paused contributes nothing.
    for i in 0..5 {
        tracker.on_fix(fix(
            37.2 + f64::from(i) * 0.01,
            -122.0,
            12.0,
            t0() + Duration::minutes(2 + i64::from(i)),
        ));
    }
    assert_eq!(tracker.distance_miles(), tracked);

    tracker.resume(t0() + Duration::minutes(10));
    assert_eq!(tracker.state(), TripState::Active);

    // First fix after resume bridges from the last pre-pause point.
    tracker.on_fix(fix(37.02, -122.0, 10.0, t0() + Duration::minutes(11)));
    assert!(tracker.distance_miles() > tracked);

    assert_eq!(notifier.count_title("Trip paused"), 1);
    assert_eq!(notifier.count_title("Trip resumed"), 1);
}

#[test]
fn test_snapshot_written_rate_limited() {
    let (mut tracker, store, _notifier) = test_tracker(TrackerConfig::default());

    tracker.start(t0(), None, false);
    tracker.on_fix(fix(37.0, -122.0, 10.0, t0()));
    // No snapshot yet: below the minimum-distance threshold.
    assert!(store.load_snapshot().is_none());

    // ~0.69 miles north clears the threshold; first eligible fix snapshots.
    let p = north_of(Coordinate::new(37.0, -122.0), 0.69);
    tracker.on_fix(fix(p.latitude, p.longitude, 10.0, t0() + Duration::seconds(2)));
    let snap = store.load_snapshot().expect("snapshot after threshold");
    let snapshot_distance = snap.distance_miles;
    assert_eq!(snap.route.len(), 2);

    // Within the 10 s rate limit: no rewrite.
    let p2 = north_of(p, 0.5);
    tracker.on_fix(fix(p2.latitude, p2.longitude, 10.0, t0() + Duration::seconds(5)));
    let snap = store.load_snapshot().unwrap();
    assert_eq!(snap.distance_miles, snapshot_distance);

    // Past the rate limit: rewritten with the grown route.
    let p3 = north_of(p2, 0.5);
    tracker.on_fix(fix(p3.latitude, p3.longitude, 10.0, t0() + Duration::seconds(13)));
    let snap = store.load_snapshot().unwrap();
    assert!(snap.distance_miles > snapshot_distance);
    assert_eq!(snap.route.len(), 4);
}

#[test]
fn test_finalize_clears_snapshot() {
    let (mut tracker, store, _notifier) = test_tracker(TrackerConfig::default());

    tracker.start(t0(), None, false);
    tracker.on_fix(fix(37.0, -122.0, 10.0, t0()));
    let p = north_of(Coordinate::new(37.0, -122.0), 1.0);
    tracker.on_fix(fix(p.latitude, p.longitude, 10.0, t0() + Duration::seconds(2)));
    assert!(store.load_snapshot().is_some());

    tracker.end_trip(t0() + Duration::minutes(5), TripCompletion::default());
    assert!(store.load_snapshot().is_none());
    assert_eq!(tracker.state(), TripState::Idle);
}

#[test]
fn test_trip_edit_and_delete() {
    let (mut tracker, store, _notifier) = test_tracker(TrackerConfig::default());

    tracker.start(t0(), None, false);
    let trip = tracker
        .end_trip(t0() + Duration::minutes(5), TripCompletion::default())
        .unwrap();

    let updated = store
        .update_trip(trip.id, |t| {
            t.notes = "airport run".to_string();
            t.pay = "45.00".to_string();
            t.photo_urls.push("photos/receipt.jpg".to_string());
        })
        .unwrap()
        .expect("trip exists");
    assert_eq!(updated.notes, "airport run");
    assert_eq!(store.load_trips()[0].photo_urls.len(), 1);

    store.delete_trip(trip.id).unwrap();
    assert!(store.load_trips().is_empty());
}

#[test]
fn test_milestone_notification_after_long_trip() {
    let (mut tracker, store, notifier) = test_tracker(TrackerConfig::default());
    let mut achievements = AchievementService::new(store.clone(), notifier.clone());

    tracker.start(t0(), None, false);
    tracker.on_fix(fix(37.0, -122.0, 30.0, t0()));
    let far = north_of(Coordinate::new(37.0, -122.0), 120.0);
    tracker.on_fix(fix(far.latitude, far.longitude, 30.0, t0() + Duration::hours(2)));

    let trip = tracker
        .end_trip(t0() + Duration::hours(2), TripCompletion::default())
        .unwrap();
    achievements.on_trip_finalized(&trip);

    assert_eq!(notifier.count_title("Milestone reached"), 1);
    assert!(achievements.state().lifetime_miles > 100.0);
}

#[test]
fn test_fresh_store_has_no_trips() {
    let store = TripStore::in_memory();
    assert!(store.load_trips().is_empty());
    assert!(store.load_favorites().is_empty());
    assert!(store.load_snapshot().is_none());
}
