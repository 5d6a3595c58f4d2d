// SPDX-License-Identifier: MIT

//! Coordinate type and great-circle distance helpers.
//!
//! Distances between consecutive GPS fixes are summed pairwise, so total
//! trip distance is an approximation whose quality depends on fix density.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Mean Earth radius in meters.
const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Meters per statute mile.
pub const METERS_PER_MILE: f64 = 1609.344;

/// A geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Haversine distance between two coordinates in meters.
///
/// The haversine intermediate is clamped into `[0, 1]` so identical and
/// antipodal inputs never feed `asin` a value outside its domain.
pub fn haversine_distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let to_rad = |deg: f64| deg * PI / 180.0;

    let dlat = to_rad(b.latitude - a.latitude);
    let dlon = to_rad(b.longitude - a.longitude);

    let h = (dlat / 2.0).sin().powi(2)
        + to_rad(a.latitude).cos() * to_rad(b.latitude).cos() * (dlon / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
}

/// Haversine distance between two coordinates in miles.
pub fn haversine_distance_miles(a: Coordinate, b: Coordinate) -> f64 {
    meters_to_miles(haversine_distance_meters(a, b))
}

pub fn meters_to_miles(meters: f64) -> f64 {
    meters / METERS_PER_MILE
}

pub fn miles_to_meters(miles: f64) -> f64 {
    miles * METERS_PER_MILE
}

/// Convert miles-per-hour to meters-per-second.
pub fn mph_to_mps(mph: f64) -> f64 {
    mph * METERS_PER_MILE / 3600.0
}

/// Sum of pairwise distances along a route, in miles.
///
/// Any single segment longer than `max_segment_miles` is treated as a GPS
/// glitch and excluded from the sum. The offending points are not removed;
/// callers that persist the route keep them.
pub fn route_distance_miles(route: &[Coordinate], max_segment_miles: f64) -> f64 {
    route
        .windows(2)
        .map(|pair| haversine_distance_miles(pair[0], pair[1]))
        .filter(|segment| *segment <= max_segment_miles)
        .sum()
}
