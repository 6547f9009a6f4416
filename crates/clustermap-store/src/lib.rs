//! Source adapters for clustermap
//!
//! Provides read-only access to the three stores the occupancy report is
//! built from:
//! - Seat/session directory (ordinary sessions without an end time)
//! - Exam session directory (sessions awaiting start or in progress)
//! - Host health registry (active workstations flagged as dead)
//!
//! Each store is wrapped by a `SourceAdapter` that maps rows into
//! normalized `SourceFact`s.

mod adapters;
mod mock;
mod sqlite;
mod traits;

pub use adapters::*;
pub use mock::*;
pub use sqlite::*;
pub use traits::*;

use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Connection lock poisoned")]
    LockPoisoned,
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
