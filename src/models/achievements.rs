//! Lifetime mileage milestones and daily-streak tracking.
//!
//! Pure derivation over finalized trips; the tracker feeds each new trip in
//! and the caller decides what to do with the emitted events.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::Trip;

/// Ascending lifetime-mileage milestones, in miles.
pub const MILEAGE_MILESTONES: [u32; 8] = [100, 250, 500, 1_000, 2_500, 5_000, 10_000, 25_000];

/// Event emitted when a trip advances an achievement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AchievementEvent {
    /// Lifetime mileage reached a milestone (miles).
    Milestone(u32),
    /// The daily streak grew to this many consecutive days.
    StreakExtended(u32),
}

/// Durable achievement counters, updated once per finalized trip.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AchievementState {
    /// Total miles across all finalized trips
    #[serde(default)]
    pub lifetime_miles: f64,
    /// Milestones already awarded (miles)
    #[serde(default)]
    pub awarded_milestones: BTreeSet<u32>,
    /// Consecutive calendar days with at least one trip
    #[serde(default)]
    pub current_streak: u32,
    /// High-water mark for `current_streak`
    #[serde(default)]
    pub longest_streak: u32,
    /// Calendar date of the most recent counted trip
    #[serde(default)]
    pub last_trip_date: Option<NaiveDate>,
}

impl AchievementState {
    /// Fold a newly finalized trip into the counters.
    ///
    /// Emits at most one milestone event per trip (the lowest unawarded
    /// milestone the new lifetime total has reached) plus a streak event when
    /// the daily streak grows.
    pub fn record_trip(&mut self, trip: &Trip) -> Vec<AchievementEvent> {
        let mut events = Vec::new();

        self.lifetime_miles += trip.distance_miles;

        let reached = MILEAGE_MILESTONES.iter().copied().find(|m| {
            !self.awarded_milestones.contains(m) && self.lifetime_miles >= f64::from(*m)
        });
        if let Some(milestone) = reached {
            self.awarded_milestones.insert(milestone);
            events.push(AchievementEvent::Milestone(milestone));
        }

        let today = trip.end_time.date_naive();
        match self.last_trip_date {
            // Already counted today: streak unchanged.
            Some(last) if last == today => {}
            Some(last) if today == last.succ_opt().unwrap_or(today) => {
                self.current_streak += 1;
                self.last_trip_date = Some(today);
                events.push(AchievementEvent::StreakExtended(self.current_streak));
            }
            _ => {
                self.current_streak = 1;
                self.last_trip_date = Some(today);
            }
        }
        self.longest_streak = self.longest_streak.max(self.current_streak);

        events
    }
}
