// SPDX-License-Identifier: MIT

//! Async wrapper around the tracker.
//!
//! The state machine itself is synchronous; this wrapper gives it the two
//! event sources it needs in a live process: the inbound fix channel and a
//! periodic tick. Both run as spawned tasks holding the tracker lock only for
//! the duration of one operation, and both are cancelled explicitly — the
//! tick task when the tracker leaves the active states, everything on
//! shutdown.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration as TokioDuration};
use uuid::Uuid;

use crate::config::TrackerConfig;
use crate::db::TripStore;
use crate::error::AppError;
use crate::models::Trip;
use crate::services::achievements::AchievementService;
use crate::services::location::{Fix, LocationSource};
use crate::services::notify::Notifier;
use crate::services::tracker::{TrackerStatus, TripCompletion, TripState, TripTracker};

pub struct TrackerRuntime {
    tracker: Arc<Mutex<TripTracker>>,
    achievements: Arc<Mutex<AchievementService>>,
    location: Arc<dyn LocationSource>,
    store: TripStore,
    fix_task: Option<JoinHandle<()>>,
    tick_task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl TrackerRuntime {
    pub fn new(
        config: TrackerConfig,
        store: TripStore,
        notifier: Arc<dyn Notifier>,
        location: Arc<dyn LocationSource>,
    ) -> Self {
        let tracker = TripTracker::new(config, store.clone(), notifier.clone());
        let achievements = AchievementService::new(store.clone(), notifier);
        Self {
            tracker: Arc::new(Mutex::new(tracker)),
            achievements: Arc::new(Mutex::new(achievements)),
            location,
            store,
            fix_task: None,
            tick_task: Arc::new(Mutex::new(None)),
        }
    }

    /// The shared store, for trip edits and favorites.
    pub fn store(&self) -> TripStore {
        self.store.clone()
    }

    pub fn status(&self) -> TrackerStatus {
        self.tracker
            .lock()
            .expect("tracker lock poisoned")
            .status(Utc::now())
    }

    /// Consume any leftover snapshot from a crashed session.
    ///
    /// Call once at startup, before wiring the fix channel or starting trips.
    pub fn recover(&self) -> Option<Trip> {
        let recovered = self
            .tracker
            .lock()
            .expect("tracker lock poisoned")
            .recover_if_present(Utc::now(), self.location.last_known());
        if let Some(trip) = &recovered {
            self.achievements
                .lock()
                .expect("achievements lock poisoned")
                .on_trip_finalized(trip);
        }
        recovered
    }

    /// Spawn the consumer task for the inbound fix channel.
    pub fn attach_fix_stream(&mut self, mut rx: mpsc::Receiver<Fix>) {
        let tracker = Arc::clone(&self.tracker);
        let achievements = Arc::clone(&self.achievements);
        let tick_task = Arc::clone(&self.tick_task);

        let handle = tokio::spawn(async move {
            while let Some(fix) = rx.recv().await {
                let (finished, state) = {
                    let mut tracker = tracker.lock().expect("tracker lock poisoned");
                    (tracker.on_fix(fix), tracker.state())
                };
                if let Some(trip) = finished {
                    achievements
                        .lock()
                        .expect("achievements lock poisoned")
                        .on_trip_finalized(&trip);
                }
                // An auto-started trip needs the tick task even though no
                // explicit start_trip call happened.
                if state != TripState::Idle {
                    spawn_tick_task(&tick_task, &tracker, &achievements);
                }
            }
        });
        self.fix_task = Some(handle);
    }

    pub fn start_trip(&self, auto_started: bool) {
        self.location.request_tracking();
        self.tracker.lock().expect("tracker lock poisoned").start(
            Utc::now(),
            self.location.last_known(),
            auto_started,
        );
        spawn_tick_task(&self.tick_task, &self.tracker, &self.achievements);
    }

    pub fn pause_trip(&self) {
        self.tracker
            .lock()
            .expect("tracker lock poisoned")
            .pause(Utc::now());
    }

    pub fn resume_trip(&self) {
        self.tracker
            .lock()
            .expect("tracker lock poisoned")
            .resume(Utc::now());
    }

    pub fn end_trip(&self, completion: TripCompletion) -> Option<Trip> {
        let trip = self
            .tracker
            .lock()
            .expect("tracker lock poisoned")
            .end_trip(Utc::now(), completion);
        if let Some(trip) = &trip {
            self.achievements
                .lock()
                .expect("achievements lock poisoned")
                .on_trip_finalized(trip);
        }
        abort_tick_task(&self.tick_task);
        trip
    }

    /// All stored trips, newest first.
    pub fn trips(&self) -> Vec<Trip> {
        self.store.load_trips()
    }

    /// Edit a stored trip's mutable fields (notes, pay, reason, media refs).
    pub fn update_trip<F>(&self, id: Uuid, mutator: F) -> Result<Trip, AppError>
    where
        F: FnOnce(&mut Trip),
    {
        self.store
            .update_trip(id, mutator)?
            .ok_or(AppError::TripNotFound(id))
    }

    pub fn delete_trip(&self, id: Uuid) -> Result<(), AppError> {
        self.store.delete_trip(id)?;
        Ok(())
    }

    pub fn delete_trips(&self, ids: &[Uuid]) -> Result<(), AppError> {
        self.store.delete_trips(ids)?;
        Ok(())
    }

    /// Cancel all spawned tasks.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.fix_task.take() {
            handle.abort();
        }
        abort_tick_task(&self.tick_task);
    }
}

impl Drop for TrackerRuntime {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Start the 1 s tick task if it is not already running. The task stops
/// itself when the tracker returns to `Idle`.
fn spawn_tick_task(
    slot: &Arc<Mutex<Option<JoinHandle<()>>>>,
    tracker: &Arc<Mutex<TripTracker>>,
    achievements: &Arc<Mutex<AchievementService>>,
) {
    let mut slot_guard = slot.lock().expect("tick slot lock poisoned");
    if slot_guard.as_ref().is_some_and(|h| !h.is_finished()) {
        return;
    }

    let tracker = Arc::clone(tracker);
    let achievements = Arc::clone(achievements);
    *slot_guard = Some(tokio::spawn(async move {
        let mut ticker = interval(TokioDuration::from_secs(1));
        loop {
            ticker.tick().await;
            let (finished, state) = {
                let mut tracker = tracker.lock().expect("tracker lock poisoned");
                (tracker.tick(Utc::now()), tracker.state())
            };
            if let Some(trip) = finished {
                achievements
                    .lock()
                    .expect("achievements lock poisoned")
                    .on_trip_finalized(&trip);
            }
            if state == TripState::Idle {
                break;
            }
        }
    }));
}

fn abort_tick_task(slot: &Arc<Mutex<Option<JoinHandle<()>>>>) {
    if let Some(handle) = slot.lock().expect("tick slot lock poisoned").take() {
        handle.abort();
    }
}
