//! Persistence layer (key-value trip store).

pub mod store;

pub use store::{FileBackend, MemoryBackend, StorageBackend, StoreError, TripStore};

/// Store key names as constants.
pub mod keys {
    pub const TRIPS: &str = "trips";
    pub const FAVORITES: &str = "favorites";
    /// Single crash-recovery snapshot slot
    pub const ONGOING_TRIP: &str = "ongoing_trip";
    /// Lifetime mileage and streak counters
    pub const ACHIEVEMENTS: &str = "achievements";
}
