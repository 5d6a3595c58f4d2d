// SPDX-License-Identifier: MIT

//! Trip lifecycle state machine.
//!
//! Owns the single in-progress trip: accumulates distance from the fix
//! stream, applies the pause/resume, round-trip and auto-detection policies,
//! writes rate-limited crash-recovery snapshots, and turns in-progress state
//! into finalized [`Trip`] records.
//!
//! Every operation takes an explicit `now` so the machine is deterministic
//! under test. State transitions:
//!
//! ```text
//! Idle -> Active -> (Paused <-> Active) -> Idle
//! ```
//!
//! Recovery is a one-shot startup operation that runs before anything else
//! and consumes any leftover snapshot.
//!
//! Persistence is best-effort throughout: a failed store write is logged and
//! the in-memory state stays authoritative. Operations invalid for the
//! current state are ignored, not errors.

use std::mem;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::config::TrackerConfig;
use crate::db::TripStore;
use crate::geo::{
    haversine_distance_meters, haversine_distance_miles, route_distance_miles, Coordinate,
};
use crate::models::{OngoingTripSnapshot, Trip};
use crate::services::location::Fix;
use crate::services::notify::Notifier;

/// Observable lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripState {
    Idle,
    Active,
    Paused,
}

/// Caller-supplied details for finalizing a trip.
#[derive(Debug, Clone, Default)]
pub struct TripCompletion {
    pub notes: String,
    pub pay: String,
    /// Category; empty means "use the configured default"
    pub reason: String,
    pub explicit_start: Option<Coordinate>,
    pub explicit_end: Option<Coordinate>,
    /// Overrides the internally accumulated route when present
    pub explicit_route: Option<Vec<Coordinate>>,
    pub average_speed_mps: Option<f64>,
}

/// Point-in-time view of the tracker for UI callers.
#[derive(Debug, Clone, Copy)]
pub struct TrackerStatus {
    pub state: TripState,
    pub distance_miles: f64,
    pub current_speed_mps: f64,
    /// Elapsed trip time excluding paused intervals
    pub elapsed: Duration,
    pub auto_started: bool,
}

/// The trip lifecycle state machine.
///
/// Single logical owner: one coherent sequence of fix events and explicit
/// operations. Not designed for concurrent mutation; the async runtime wraps
/// it in a mutex.
pub struct TripTracker {
    config: TrackerConfig,
    store: TripStore,
    notifier: Arc<dyn Notifier>,

    state: TripState,
    auto_started: bool,
    start_time: Option<DateTime<Utc>>,
    start_location: Option<Coordinate>,
    route: Vec<Coordinate>,
    distance_miles: f64,
    current_speed_mps: f64,

    pause_started_at: Option<DateTime<Utc>>,
    total_paused: Duration,

    /// Most recent fix position seen in any state
    last_known: Option<Coordinate>,
    last_snapshot_at: Option<DateTime<Utc>>,

    // Policy timers: deadlines are armed by fixes and checked on every fix
    // and every tick, cleared on each state transition.
    stationary_since: Option<DateTime<Utc>>,
    below_speed_since: Option<DateTime<Utc>>,
    inside_start_radius: bool,
}

impl TripTracker {
    pub fn new(config: TrackerConfig, store: TripStore, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            config,
            store,
            notifier,
            state: TripState::Idle,
            auto_started: false,
            start_time: None,
            start_location: None,
            route: Vec::new(),
            distance_miles: 0.0,
            current_speed_mps: 0.0,
            pause_started_at: None,
            total_paused: Duration::zero(),
            last_known: None,
            last_snapshot_at: None,
            stationary_since: None,
            below_speed_since: None,
            inside_start_radius: false,
        }
    }

    // ─── Observables ─────────────────────────────────────────────

    pub fn state(&self) -> TripState {
        self.state
    }

    pub fn distance_miles(&self) -> f64 {
        self.distance_miles
    }

    pub fn current_speed_mps(&self) -> f64 {
        self.current_speed_mps
    }

    pub fn is_paused(&self) -> bool {
        self.state == TripState::Paused
    }

    /// All stored trips, newest first.
    pub fn trips(&self) -> Vec<Trip> {
        self.store.load_trips()
    }

    pub fn status(&self, now: DateTime<Utc>) -> TrackerStatus {
        let elapsed = match (self.state, self.start_time) {
            (TripState::Idle, _) | (_, None) => Duration::zero(),
            (_, Some(start)) => {
                let mut paused = self.total_paused;
                if let Some(pause_start) = self.pause_started_at {
                    paused += now - pause_start;
                }
                (now - start - paused).max(Duration::zero())
            }
        };
        TrackerStatus {
            state: self.state,
            distance_miles: self.distance_miles,
            current_speed_mps: self.current_speed_mps,
            elapsed,
            auto_started: self.auto_started,
        }
    }

    /// Swap in a new configuration; takes effect on the next operation.
    pub fn apply_config(&mut self, config: TrackerConfig) {
        self.config = config;
    }

    // ─── Lifecycle Operations ────────────────────────────────────

    /// Begin a new trip. No-op unless `Idle`.
    pub fn start(
        &mut self,
        now: DateTime<Utc>,
        current_location: Option<Coordinate>,
        auto_started: bool,
    ) {
        if self.state != TripState::Idle {
            tracing::debug!(state = ?self.state, "Ignoring start outside Idle");
            return;
        }

        // A previous trip's timers and buffers must all be gone before a new
        // trip begins.
        self.reset_active_state();

        self.state = TripState::Active;
        self.auto_started = auto_started;
        self.start_time = Some(now);
        self.start_location = current_location.or(self.last_known);
        self.inside_start_radius = self.start_location.is_some();

        // Any snapshot still lying around belongs to a dead trip.
        if let Err(e) = self.store.clear_snapshot() {
            tracing::warn!(error = %e, "Failed to clear stale snapshot");
        }

        tracing::info!(auto_started, "Trip started");
        if auto_started {
            self.notifier
                .post("Trip started", "Driving detected, tracking started");
        }
    }

    /// Pause distance/route accrual. No-op unless `Active`.
    pub fn pause(&mut self, now: DateTime<Utc>) {
        if self.state != TripState::Active {
            tracing::debug!(state = ?self.state, "Ignoring pause outside Active");
            return;
        }

        self.state = TripState::Paused;
        self.pause_started_at = Some(now);
        self.stationary_since = None;
        self.below_speed_since = None;

        // Capture the route-so-far while paused so a crash during the pause
        // still recovers.
        self.write_snapshot(now);

        tracing::info!(distance_miles = self.distance_miles, "Trip paused");
        self.notifier.post("Trip paused", "Distance tracking is paused");
    }

    /// Resume distance/route accrual. No-op unless `Paused`.
    pub fn resume(&mut self, now: DateTime<Utc>) {
        if self.state != TripState::Paused {
            tracing::debug!(state = ?self.state, "Ignoring resume outside Paused");
            return;
        }

        if let Some(pause_start) = self.pause_started_at.take() {
            self.total_paused += (now - pause_start).max(Duration::zero());
        }
        self.state = TripState::Active;

        tracing::info!("Trip resumed");
        self.notifier.post("Trip resumed", "Distance tracking resumed");
    }

    /// Consume one location fix.
    ///
    /// Returns a finalized trip when a policy (auto-stop) ends the trip as a
    /// result of this fix.
    pub fn on_fix(&mut self, fix: Fix) -> Option<Trip> {
        self.last_known = Some(fix.coordinate);

        match self.state {
            TripState::Idle => {
                if self.config.auto_detect_enabled
                    && fix.has_valid_speed()
                    && fix.speed_mps >= self.config.auto_start_speed_mps
                {
                    self.start(fix.timestamp, Some(fix.coordinate), true);
                    // Fall through so this fix becomes the first route point.
                } else {
                    return None;
                }
            }
            TripState::Paused => {
                // Paused trips keep the speed observable fresh but accrue
                // nothing.
                if fix.has_valid_speed() {
                    self.current_speed_mps = fix.speed_mps;
                }
                return None;
            }
            TripState::Active => {}
        }

        if let Some(prev) = self.route.last() {
            self.distance_miles += haversine_distance_miles(*prev, fix.coordinate);
        }
        self.route.push(fix.coordinate);

        if fix.has_valid_speed() {
            self.current_speed_mps = fix.speed_mps;

            if fix.speed_mps < self.config.stationary_speed_mps {
                self.stationary_since.get_or_insert(fix.timestamp);
                self.below_speed_since.get_or_insert(fix.timestamp);
            } else {
                self.stationary_since = None;
                self.below_speed_since = None;
            }
        }

        self.maybe_snapshot(fix.timestamp);
        self.check_round_trip(fix.coordinate);
        self.evaluate_timers(fix.timestamp)
    }

    /// Periodic timer body driven by the runtime while a trip is active.
    ///
    /// Policy deadlines can expire between fixes (a stationary GPS may stop
    /// reporting), so the speed-check runs here too.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Trip> {
        if self.state != TripState::Active {
            return None;
        }
        self.evaluate_timers(now)
    }

    /// Finalize the in-progress trip into a stored [`Trip`].
    ///
    /// Valid from `Active` or `Paused` (implicitly exits pause without
    /// crediting further distance); returns `None` when `Idle`.
    pub fn end_trip(&mut self, now: DateTime<Utc>, completion: TripCompletion) -> Option<Trip> {
        if self.state == TripState::Idle {
            tracing::debug!("Ignoring end_trip while Idle");
            return None;
        }
        Some(self.finalize(now, completion, false))
    }

    // ─── Crash Recovery ──────────────────────────────────────────

    /// Consume a leftover snapshot from a crashed session, if any.
    ///
    /// Runs once at startup, before any `start` call. The snapshot slot is
    /// cleared afterward whether or not recovery produced a trip, so each
    /// snapshot gets at most one recovery attempt.
    pub fn recover_if_present(
        &mut self,
        now: DateTime<Utc>,
        current_location: Option<Coordinate>,
    ) -> Option<Trip> {
        if self.state != TripState::Idle {
            tracing::debug!(state = ?self.state, "Ignoring recovery outside Idle");
            return None;
        }

        let snapshot = self.store.load_snapshot()?;
        let recovered = self.try_recover(now, current_location, snapshot);

        if let Err(e) = self.store.clear_snapshot() {
            tracing::warn!(error = %e, "Failed to clear consumed snapshot");
        }
        recovered
    }

    fn try_recover(
        &mut self,
        now: DateTime<Utc>,
        current_location: Option<Coordinate>,
        snapshot: OngoingTripSnapshot,
    ) -> Option<Trip> {
        // Distance is recomputed from the persisted route with glitch jumps
        // excluded from the sum (the points themselves stay in the route).
        let filtered_miles =
            route_distance_miles(&snapshot.route, self.config.glitch_segment_miles);

        if filtered_miles < self.config.recovery_min_distance_miles {
            tracing::info!(
                distance_miles = filtered_miles,
                "Discarding snapshot below recovery threshold"
            );
            return None;
        }

        // Idempotence across restarts: if a recovered trip with this start
        // time already exists, the snapshot was already consumed.
        let window = Duration::seconds(self.config.recovery_dedup_window_secs);
        let already_recovered = self.store.load_trips().iter().any(|t| {
            t.is_recovered && (t.start_time - snapshot.start_time).abs() <= window
        });
        if already_recovered {
            tracing::info!("Snapshot already recovered, skipping");
            return None;
        }

        let endpoint = current_location.or_else(|| snapshot.route.last().copied());

        self.state = TripState::Active;
        self.auto_started = false;
        self.start_time = Some(snapshot.start_time);
        self.start_location = snapshot.start_location;
        self.route = snapshot.route;
        self.distance_miles = filtered_miles;
        self.total_paused = Duration::seconds(snapshot.total_paused_secs);
        self.last_known = endpoint.or(self.last_known);

        let completion = TripCompletion {
            explicit_end: endpoint,
            ..TripCompletion::default()
        };
        let trip = self.finalize(now.max(snapshot.start_time), completion, true);

        tracing::info!(
            trip_id = %trip.id,
            distance_miles = trip.distance_miles,
            "Recovered in-progress trip"
        );
        self.notifier
            .post("Trip recovered", "An interrupted trip was saved");
        Some(trip)
    }

    // ─── Internals ───────────────────────────────────────────────

    fn finalize(&mut self, now: DateTime<Utc>, completion: TripCompletion, is_recovered: bool) -> Trip {
        let start_time = self.start_time.unwrap_or(now);
        let end_time = now.max(start_time);

        let raw_route = completion
            .explicit_route
            .unwrap_or_else(|| mem::take(&mut self.route));

        let start_candidate = completion
            .explicit_start
            .or(self.start_location)
            .or(self.last_known);
        let end_candidate = completion.explicit_end.or(self.last_known);

        let route = pad_route(raw_route, start_candidate, end_candidate);

        let reason = if completion.reason.is_empty() {
            self.config.default_reason.clone()
        } else {
            completion.reason
        };

        // Caller-supplied endpoints win over the route ends; recovery relies
        // on this to stamp the current location as the end coordinate even
        // when the snapshot route is already well-formed.
        let trip = Trip {
            id: Uuid::new_v4(),
            start_time,
            end_time,
            distance_miles: self.distance_miles,
            start_coordinate: completion
                .explicit_start
                .or_else(|| route.first().copied())
                .or(start_candidate),
            end_coordinate: completion
                .explicit_end
                .or_else(|| route.last().copied())
                .or(end_candidate),
            route,
            notes: completion.notes,
            pay: completion.pay,
            reason,
            photo_urls: Vec::new(),
            audio_notes: Vec::new(),
            is_recovered,
            average_speed_mps: completion.average_speed_mps,
        };

        if let Err(e) = self.store.insert_trip(&trip) {
            tracing::warn!(trip_id = %trip.id, error = %e, "Failed to persist trip");
        }
        if let Err(e) = self.store.clear_snapshot() {
            tracing::warn!(error = %e, "Failed to clear snapshot after finalize");
        }

        self.reset_active_state();
        self.state = TripState::Idle;

        tracing::info!(
            trip_id = %trip.id,
            distance_miles = trip.distance_miles,
            is_recovered,
            "Trip finalized"
        );
        trip
    }

    /// Clear everything belonging to the in-progress trip, including policy
    /// timers. Every path leaving `Active`/`Paused` ends up here.
    fn reset_active_state(&mut self) {
        self.auto_started = false;
        self.start_time = None;
        self.start_location = None;
        self.route.clear();
        self.distance_miles = 0.0;
        self.current_speed_mps = 0.0;
        self.pause_started_at = None;
        self.total_paused = Duration::zero();
        self.last_snapshot_at = None;
        self.stationary_since = None;
        self.below_speed_since = None;
        self.inside_start_radius = false;
    }

    /// Opportunistic snapshot write: rate-limited, and skipped entirely until
    /// the trip has covered enough ground to be worth recovering.
    fn maybe_snapshot(&mut self, now: DateTime<Utc>) {
        if self.distance_miles < self.config.snapshot_min_distance_miles {
            return;
        }
        if let Some(last) = self.last_snapshot_at {
            if now - last < Duration::seconds(self.config.snapshot_interval_secs) {
                return;
            }
        }
        self.write_snapshot(now);
    }

    fn write_snapshot(&mut self, now: DateTime<Utc>) {
        let Some(start_time) = self.start_time else {
            return;
        };
        let snapshot = OngoingTripSnapshot {
            start_location: self.start_location,
            start_time,
            route: self.route.clone(),
            distance_miles: self.distance_miles,
            is_paused: self.state == TripState::Paused,
            total_paused_secs: self.total_paused.num_seconds(),
        };
        match self.store.save_snapshot(&snapshot) {
            Ok(()) => self.last_snapshot_at = Some(now),
            // Best-effort: the in-memory trip continues either way.
            Err(e) => tracing::warn!(error = %e, "Failed to write snapshot"),
        }
    }

    /// Round-trip advisory: one shot per proximity re-entry, never while
    /// sitting inside the radius.
    fn check_round_trip(&mut self, position: Coordinate) {
        if !self.config.round_trip_detection_enabled || !self.auto_started {
            return;
        }
        let Some(start) = self.start_location else {
            return;
        };

        let inside =
            haversine_distance_meters(start, position) <= self.config.round_trip_radius_meters;
        if inside && !self.inside_start_radius {
            if self.distance_miles >= self.config.round_trip_min_distance_miles {
                tracing::info!(
                    distance_miles = self.distance_miles,
                    "Round trip detected"
                );
                self.notifier.post(
                    "Back at your starting point",
                    "Looks like a round trip. End the trip?",
                );
            }
        }
        self.inside_start_radius = inside;
    }

    /// Smart-pause and auto-stop deadlines. Both apply only to auto-started
    /// trips while `Active`.
    fn evaluate_timers(&mut self, now: DateTime<Utc>) -> Option<Trip> {
        if self.state != TripState::Active || !self.auto_started {
            return None;
        }

        if self.config.auto_detect_enabled {
            if let Some(since) = self.below_speed_since {
                if now - since >= Duration::seconds(self.config.auto_stop_delay_secs) {
                    tracing::info!("Auto-stopping trip after sustained low speed");
                    let trip = self.finalize(now, TripCompletion::default(), false);
                    self.notifier
                        .post("Trip ended", "Trip ended automatically after you stopped");
                    return Some(trip);
                }
            }
        }

        if self.config.smart_pause_enabled {
            if let Some(since) = self.stationary_since {
                if now - since >= Duration::seconds(self.config.smart_pause_delay_secs) {
                    tracing::info!("Smart-pausing stationary trip");
                    self.pause(now);
                }
            }
        }

        None
    }
}

/// Enforce the route-length invariant: every finalized route is empty or has
/// at least two points.
///
/// An empty route is synthesized from the start/end candidates when possible;
/// a one-point route is padded by duplicating its point. Downstream polyline
/// rendering must never see a single-point line.
fn pad_route(
    route: Vec<Coordinate>,
    start: Option<Coordinate>,
    end: Option<Coordinate>,
) -> Vec<Coordinate> {
    match route.len() {
        0 => match (start, end) {
            (Some(s), Some(e)) if s != e => vec![s, e],
            (Some(p), _) | (None, Some(p)) => vec![p, p],
            (None, None) => Vec::new(),
        },
        1 => vec![route[0], route[0]],
        _ => route,
    }
}
