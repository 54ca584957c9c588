//! Typed access to the medication and dose-history collections.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{Collection, KeyValueStore, StoreError, StoreResult};
use crate::models::{DosageHistory, Medication};

/// Whole-collection repository over a key-value store.
pub struct Repository<S> {
    store: S,
}

impl<S: KeyValueStore> Repository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Get the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load a collection. Missing or unreadable data yields an empty list.
    pub fn load<T: DeserializeOwned>(&self, collection: Collection) -> Vec<T> {
        let raw = match self.store.get(collection.key()) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!(key = collection.key(), "Collection not stored yet");
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(key = collection.key(), error = %e, "Error reading collection");
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(key = collection.key(), error = %e, "Error parsing collection");
                Vec::new()
            }
        }
    }

    /// Load a collection that is about to be rewritten.
    ///
    /// Unlike [`Repository::load`], unreadable data is an error, so a
    /// read-modify-write never replaces records it could not parse.
    pub fn load_for_update<T: DeserializeOwned>(
        &self,
        collection: Collection,
    ) -> StoreResult<Vec<T>> {
        match self.store.get(collection.key())? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Replace a collection.
    pub fn save<T: Serialize>(&self, collection: Collection, records: &[T]) -> StoreResult<()> {
        let json = serde_json::to_string(records)?;
        self.store.set(collection.key(), &json)
    }

    /// Remove both collections.
    pub fn clear_all(&self) -> StoreResult<()> {
        for collection in Collection::ALL {
            self.store.remove(collection.key())?;
        }
        Ok(())
    }

    // =========================================================================
    // Medications
    // =========================================================================

    /// List all medications in stored order.
    pub fn load_medications(&self) -> Vec<Medication> {
        self.load(Collection::Medications)
    }

    pub fn save_medications(&self, medications: &[Medication]) -> StoreResult<()> {
        self.save(Collection::Medications, medications)
    }

    /// Get a medication by ID.
    pub fn get_medication(&self, id: &str) -> Option<Medication> {
        self.load_medications().into_iter().find(|m| m.id == id)
    }

    /// Append a new medication. IDs must be unique.
    pub fn add_medication(&self, medication: &Medication) -> StoreResult<()> {
        let mut medications: Vec<Medication> = self.load_for_update(Collection::Medications)?;
        if medications.iter().any(|m| m.id == medication.id) {
            return Err(StoreError::Constraint(format!(
                "medication {} already exists",
                medication.id
            )));
        }
        medications.push(medication.clone());
        self.save_medications(&medications)
    }

    /// Replace a medication in place. Returns false if the ID is unknown.
    pub fn update_medication(&self, medication: &Medication) -> StoreResult<bool> {
        let mut medications: Vec<Medication> = self.load_for_update(Collection::Medications)?;
        match medications.iter_mut().find(|m| m.id == medication.id) {
            Some(existing) => {
                *existing = medication.clone();
                self.save_medications(&medications)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Delete a medication. Returns false if the ID is unknown.
    pub fn delete_medication(&self, id: &str) -> StoreResult<bool> {
        let mut medications: Vec<Medication> = self.load_for_update(Collection::Medications)?;
        let before = medications.len();
        medications.retain(|m| m.id != id);
        if medications.len() == before {
            return Ok(false);
        }
        self.save_medications(&medications)?;
        Ok(true)
    }

    // =========================================================================
    // Dose history
    // =========================================================================

    /// Full dose log in recording order.
    pub fn load_dose_history(&self) -> Vec<DosageHistory> {
        self.load(Collection::DosageHistory)
    }

    pub fn save_dose_history(&self, history: &[DosageHistory]) -> StoreResult<()> {
        self.save(Collection::DosageHistory, history)
    }

    /// Append one entry to the log.
    pub fn append_dose(&self, entry: &DosageHistory) -> StoreResult<()> {
        let mut history: Vec<DosageHistory> = self.load_for_update(Collection::DosageHistory)?;
        history.push(entry.clone());
        self.save_dose_history(&history)
    }
}
