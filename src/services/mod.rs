// SPDX-License-Identifier: MIT

//! Services module - tracking logic and boundary interfaces.

pub mod achievements;
pub mod location;
pub mod notify;
pub mod runtime;
pub mod tracker;

pub use achievements::AchievementService;
pub use location::{fix_channel, Fix, LocationSource, NullLocationSource};
pub use notify::{LogNotifier, Notifier, NullNotifier};
pub use runtime::TrackerRuntime;
pub use tracker::{TrackerStatus, TripCompletion, TripState, TripTracker};
