// SPDX-License-Identifier: MIT

//! Roadlog replay tool.
//!
//! Replays a recorded fix log (JSON array of fixes) through the trip
//! tracker against the on-disk store: runs crash recovery first, then
//! tracks the replayed trip to completion and reports the result. Useful
//! for exercising the lifecycle and recovery paths against real GPS logs.

use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roadlog::config::TrackerConfig;
use roadlog::db::TripStore;
use roadlog::geo::Coordinate;
use roadlog::services::achievements::AchievementService;
use roadlog::services::notify::LogNotifier;
use roadlog::services::tracker::{TripCompletion, TripState, TripTracker};
use roadlog::services::Fix;

/// One record in a replay log.
#[derive(Debug, Deserialize)]
struct ReplayFix {
    latitude: f64,
    longitude: f64,
    /// Negative means no valid speed reading
    #[serde(default = "invalid_speed")]
    speed_mps: f64,
    timestamp: DateTime<Utc>,
}

fn invalid_speed() -> f64 {
    -1.0
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let config = TrackerConfig::from_env();
    tracing::info!(data_dir = %config.data_dir.display(), "Starting roadlog replay");

    let store = TripStore::open(&config.data_dir).context("Failed to open trip store")?;
    let notifier = Arc::new(LogNotifier);
    let mut tracker = TripTracker::new(config.clone(), store.clone(), notifier.clone());
    let mut achievements = AchievementService::new(store.clone(), notifier);

    // Crash recovery runs before anything else touches the tracker.
    if let Some(trip) = tracker.recover_if_present(Utc::now(), None) {
        achievements.on_trip_finalized(&trip);
        tracing::info!(
            trip_id = %trip.id,
            distance_miles = trip.distance_miles,
            "Recovered trip from previous session"
        );
    }

    let Some(path) = std::env::args().nth(1) else {
        tracing::info!(
            trip_count = store.load_trips().len(),
            "No fix log given, nothing to replay"
        );
        return Ok(());
    };

    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read fix log {path}"))?;
    let fixes: Vec<ReplayFix> =
        serde_json::from_str(&raw).context("Fix log is not a JSON array of fixes")?;
    anyhow::ensure!(!fixes.is_empty(), "Fix log is empty");

    tracing::info!(path, count = fixes.len(), "Replaying fix log");

    // With auto-detect enabled the first fast-enough fix starts the trip;
    // otherwise start explicitly at the first fix.
    if !config.auto_detect_enabled {
        tracker.start(fixes[0].timestamp, None, false);
    }

    let mut last_timestamp = fixes[0].timestamp;
    for fix in &fixes {
        let finished = tracker.on_fix(Fix::new(
            Coordinate::new(fix.latitude, fix.longitude),
            fix.speed_mps,
            fix.timestamp,
        ));
        if let Some(trip) = finished {
            achievements.on_trip_finalized(&trip);
        }
        last_timestamp = fix.timestamp;
    }

    if tracker.state() != TripState::Idle {
        let trip = tracker
            .end_trip(last_timestamp, TripCompletion::default())
            .context("Tracker was mid-trip but end_trip returned nothing")?;
        achievements.on_trip_finalized(&trip);
        tracing::info!(
            trip_id = %trip.id,
            distance_miles = trip.distance_miles,
            route_points = trip.route.len(),
            duration_secs = trip.duration().num_seconds(),
            "Replayed trip finalized"
        );
    }

    let state = achievements.state();
    tracing::info!(
        lifetime_miles = state.lifetime_miles,
        current_streak = state.current_streak,
        longest_streak = state.longest_streak,
        "Totals after replay"
    );
    Ok(())
}

/// Initialize structured logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer().with_target(false);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("roadlog=debug".parse().expect("valid directive"))
                .add_directive("info".parse().expect("valid directive")),
        )
        .with(format)
        .init();
}
