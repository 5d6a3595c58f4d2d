// SPDX-License-Identifier: MIT

//! Roadlog: trip tracking core.
//!
//! Records driving trips from a stream of GPS fixes: distance accumulation,
//! pause/resume, auto start/stop heuristics, round-trip detection, crash
//! recovery of in-progress trips, favorite addresses, and lifetime mileage
//! achievements.
//!
//! The heart of the crate is [`services::tracker::TripTracker`], a
//! deterministic state machine driven by explicit timestamps;
//! [`services::runtime::TrackerRuntime`] wires it to a live fix channel and
//! timer under tokio.

pub mod config;
pub mod db;
pub mod error;
pub mod geo;
pub mod models;
pub mod services;

pub use config::TrackerConfig;
pub use db::TripStore;
pub use error::{AppError, Result};
pub use models::{FavoriteAddress, Trip};
pub use services::{Fix, TrackerRuntime, TripCompletion, TripState, TripTracker};
