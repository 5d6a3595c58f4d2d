// SPDX-License-Identifier: MIT

//! Saved destination addresses.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::Coordinate;

/// A user-named saved destination. No lifecycle coupling to trips.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteAddress {
    pub id: Uuid,
    /// Display name ("Home", "Airport", ...)
    pub name: String,
    /// Street address as entered
    pub address: String,
    /// Geocoded coordinate, if available
    pub coordinate: Option<Coordinate>,
    /// Category ("Client", "Personal", ...)
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub notes: String,
}

impl FavoriteAddress {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            address: address.into(),
            coordinate: None,
            category: String::new(),
            notes: String::new(),
        }
    }
}
