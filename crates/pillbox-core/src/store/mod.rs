//! Persistence layer for pillbox.
//!
//! Both collections live in an opaque key-value store as JSON arrays under
//! fixed keys. Reads always work on the whole collection and fail soft;
//! writes replace the whole collection and propagate errors.

mod memory;
mod repository;
mod schema;
mod sqlite;

pub use memory::*;
pub use repository::*;
pub use schema::*;
pub use sqlite::*;

use thiserror::Error;

/// Storage errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        StoreError::Unavailable(format!("Lock poisoned: {}", e))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Opaque string key-value store.
pub trait KeyValueStore {
    /// Read a value. Missing keys are `Ok(None)`.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove a key. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> StoreResult<()>;
}

/// The two persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Medications,
    DosageHistory,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Medications, Collection::DosageHistory];

    /// Storage key for the collection.
    pub fn key(&self) -> &'static str {
        match self {
            Collection::Medications => "@medications",
            Collection::DosageHistory => "@dosage_history",
        }
    }
}
