// SPDX-License-Identifier: MIT

//! Achievement service: applies finalized trips to the durable counters and
//! surfaces milestone/streak notifications.

use std::sync::Arc;

use crate::db::TripStore;
use crate::models::{AchievementEvent, AchievementState, Trip};
use crate::services::notify::Notifier;

pub struct AchievementService {
    state: AchievementState,
    store: TripStore,
    notifier: Arc<dyn Notifier>,
}

impl AchievementService {
    /// Load persisted counters (or fresh ones) from the store.
    pub fn new(store: TripStore, notifier: Arc<dyn Notifier>) -> Self {
        let state = store.load_achievements();
        Self {
            state,
            store,
            notifier,
        }
    }

    pub fn state(&self) -> &AchievementState {
        &self.state
    }

    /// Fold a finalized trip into the counters, persist them best-effort, and
    /// post one notification per emitted event.
    pub fn on_trip_finalized(&mut self, trip: &Trip) -> Vec<AchievementEvent> {
        let events = self.state.record_trip(trip);

        if let Err(e) = self.store.save_achievements(&self.state) {
            tracing::warn!(error = %e, "Failed to persist achievement state");
        }

        for event in &events {
            match event {
                AchievementEvent::Milestone(miles) => {
                    tracing::info!(miles, "Mileage milestone reached");
                    self.notifier.post(
                        "Milestone reached",
                        &format!("You've driven {miles} lifetime miles!"),
                    );
                }
                AchievementEvent::StreakExtended(days) => {
                    tracing::info!(days, "Daily streak extended");
                    self.notifier
                        .post("Streak extended", &format!("{days} days in a row!"));
                }
            }
        }
        events
    }
}
