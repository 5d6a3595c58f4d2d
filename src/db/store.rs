// SPDX-License-Identifier: MIT

//! Durable key-value persistence for trips, favorites and the recovery
//! snapshot.
//!
//! Every collection is serialized whole on each mutation and deserialized
//! whole on each read. Trip counts are bounded by one user's driving history,
//! so this stays cheap. Corrupt or unreadable data is treated as an empty
//! collection, never an error: the recovery path in particular must not fail
//! at startup because of a bad blob.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::db::keys;
use crate::models::{AchievementState, FavoriteAddress, OngoingTripSnapshot, Trip};

/// Errors from the storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Generic durable key-value store: one opaque blob per key.
pub trait StorageBackend: Send + Sync {
    fn save(&self, key: &str, blob: &[u8]) -> Result<(), StoreError>;
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// File-per-key backend rooted at a data directory.
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Open (creating if needed) a backend rooted at `dir`.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
        })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StorageBackend for FileBackend {
    fn save(&self, key: &str, blob: &[u8]) -> Result<(), StoreError> {
        // Write-then-rename so a crash mid-write cannot corrupt the slot.
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        std::fs::write(&tmp, blob)?;
        std::fs::rename(&tmp, self.path_for(key))?;
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match std::fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory backend for tests and offline use.
#[derive(Default)]
pub struct MemoryBackend {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl StorageBackend for MemoryBackend {
    fn save(&self, key: &str, blob: &[u8]) -> Result<(), StoreError> {
        self.blobs
            .lock()
            .expect("backend lock poisoned")
            .insert(key.to_string(), blob.to_vec());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self
            .blobs
            .lock()
            .expect("backend lock poisoned")
            .get(key)
            .cloned())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.blobs
            .lock()
            .expect("backend lock poisoned")
            .remove(key);
        Ok(())
    }
}

/// Typed store over a [`StorageBackend`].
#[derive(Clone)]
pub struct TripStore {
    backend: Arc<dyn StorageBackend>,
}

impl TripStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Store backed by a data directory on disk.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        Ok(Self::new(Arc::new(FileBackend::open(dir)?)))
    }

    /// In-memory store for tests and offline use.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::default()))
    }

    /// Load a whole collection, treating missing or corrupt data as empty.
    fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.backend.load(key) {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!(key, error = %e, "Corrupt data in store, treating as empty");
                    T::default()
                }
            },
            Ok(None) => T::default(),
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read from store, treating as empty");
                T::default()
            }
        }
    }

    fn save_value<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(value)?;
        self.backend.save(key, &bytes)
    }

    // ─── Trip Operations ─────────────────────────────────────────

    /// All trips, newest first.
    pub fn load_trips(&self) -> Vec<Trip> {
        self.load_or_default(keys::TRIPS)
    }

    /// Insert a new trip at the front of the collection.
    pub fn insert_trip(&self, trip: &Trip) -> Result<(), StoreError> {
        let mut trips = self.load_trips();
        trips.insert(0, trip.clone());
        self.save_value(keys::TRIPS, &trips)
    }

    /// Apply `mutator` to the trip with the given id.
    ///
    /// Returns the updated trip, or `None` if no trip has that id.
    pub fn update_trip<F>(&self, id: Uuid, mutator: F) -> Result<Option<Trip>, StoreError>
    where
        F: FnOnce(&mut Trip),
    {
        let mut trips = self.load_trips();
        let Some(trip) = trips.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        mutator(trip);
        let updated = trip.clone();
        self.save_value(keys::TRIPS, &trips)?;
        Ok(Some(updated))
    }

    pub fn delete_trip(&self, id: Uuid) -> Result<(), StoreError> {
        self.delete_trips(&[id])
    }

    pub fn delete_trips(&self, ids: &[Uuid]) -> Result<(), StoreError> {
        let mut trips = self.load_trips();
        trips.retain(|t| !ids.contains(&t.id));
        self.save_value(keys::TRIPS, &trips)
    }

    // ─── Favorite Addresses ──────────────────────────────────────

    pub fn load_favorites(&self) -> Vec<FavoriteAddress> {
        self.load_or_default(keys::FAVORITES)
    }

    pub fn insert_favorite(&self, favorite: &FavoriteAddress) -> Result<(), StoreError> {
        let mut favorites = self.load_favorites();
        favorites.push(favorite.clone());
        self.save_value(keys::FAVORITES, &favorites)
    }

    pub fn update_favorite<F>(
        &self,
        id: Uuid,
        mutator: F,
    ) -> Result<Option<FavoriteAddress>, StoreError>
    where
        F: FnOnce(&mut FavoriteAddress),
    {
        let mut favorites = self.load_favorites();
        let Some(favorite) = favorites.iter_mut().find(|f| f.id == id) else {
            return Ok(None);
        };
        mutator(favorite);
        let updated = favorite.clone();
        self.save_value(keys::FAVORITES, &favorites)?;
        Ok(Some(updated))
    }

    pub fn delete_favorite(&self, id: Uuid) -> Result<(), StoreError> {
        let mut favorites = self.load_favorites();
        favorites.retain(|f| f.id != id);
        self.save_value(keys::FAVORITES, &favorites)
    }

    // ─── Ongoing-Trip Snapshot ───────────────────────────────────

    /// The single crash-recovery snapshot slot, if present and parseable.
    pub fn load_snapshot(&self) -> Option<OngoingTripSnapshot> {
        self.load_or_default::<Option<OngoingTripSnapshot>>(keys::ONGOING_TRIP)
    }

    pub fn save_snapshot(&self, snapshot: &OngoingTripSnapshot) -> Result<(), StoreError> {
        self.save_value(keys::ONGOING_TRIP, &Some(snapshot))
    }

    pub fn clear_snapshot(&self) -> Result<(), StoreError> {
        self.backend.delete(keys::ONGOING_TRIP)
    }

    // ─── Achievement State ───────────────────────────────────────

    pub fn load_achievements(&self) -> AchievementState {
        self.load_or_default(keys::ACHIEVEMENTS)
    }

    pub fn save_achievements(&self, state: &AchievementState) -> Result<(), StoreError> {
        self.save_value(keys::ACHIEVEMENTS, state)
    }
}
