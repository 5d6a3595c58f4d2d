// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod achievements;
pub mod favorite;
pub mod snapshot;
pub mod trip;

pub use achievements::{AchievementEvent, AchievementState};
pub use favorite::FavoriteAddress;
pub use snapshot::OngoingTripSnapshot;
pub use trip::Trip;
