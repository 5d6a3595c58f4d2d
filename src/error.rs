// SPDX-License-Identifier: MIT

//! Application error types.
//!
//! Note that tracker lifecycle operations do not return errors: persistence
//! is best-effort and invalid transitions are no-ops. These types cover the
//! explicit store-facing operations (trip edits, deletes) and startup.

use uuid::Uuid;

use crate::db::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Trip not found: {0}")]
    TripNotFound(Uuid),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Result type alias for store-facing operations.
pub type Result<T> = std::result::Result<T, AppError>;
