//! Medication service: the entry point for UI events.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::progress::{compute_completion, dose_statuses, notification_candidates, DailyProgress, DoseStatus};
use super::today::{history_for_day, todays_medications};
use crate::config::PillboxConfig;
use crate::models::{DosageHistory, Medication};
use crate::notifications::{NotificationScheduler, ReminderScheduler, ReminderUpdate};
use crate::store::{Collection, KeyValueStore, Repository, StoreError};

/// Service errors.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Medication not found: {0}")]
    MedicationNotFound(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Everything the home screen shows for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyOverview {
    /// Active medications in stored order
    pub medications: Vec<Medication>,
    /// Taken state per active medication
    pub statuses: Vec<DoseStatus>,
    pub progress: DailyProgress,
    /// Active medications with a skipped dose today
    pub needs_attention: Vec<Medication>,
}

/// Coordinates storage, reminders and dose tracking.
pub struct MedicationService<S, N> {
    repo: Repository<S>,
    reminders: ReminderScheduler<N>,
    config: PillboxConfig,
}

impl<S: KeyValueStore, N: NotificationScheduler> MedicationService<S, N> {
    /// Create a new service.
    pub fn new(store: S, notifier: N, config: PillboxConfig) -> Self {
        Self {
            repo: Repository::new(store),
            reminders: ReminderScheduler::new(notifier, config.reminder_policy),
            config,
        }
    }

    pub fn repository(&self) -> &Repository<S> {
        &self.repo
    }

    pub fn reminders(&self) -> &ReminderScheduler<N> {
        &self.reminders
    }

    pub fn config(&self) -> &PillboxConfig {
        &self.config
    }

    // =========================================================================
    // Medication lifecycle
    // =========================================================================

    pub fn list_medications(&self) -> Vec<Medication> {
        self.repo.load_medications()
    }

    pub fn get_medication(&self, id: &str) -> Option<Medication> {
        self.repo.get_medication(id)
    }

    /// Save a new medication, then schedule its reminders.
    pub fn add_medication<Tz: TimeZone>(
        &self,
        medication: &Medication,
        now: &DateTime<Tz>,
    ) -> ServiceResult<ReminderUpdate> {
        self.repo.add_medication(medication)?;
        Ok(self.reminders.update_medication_reminders(medication, now))
    }

    /// Save an edited medication, then replace its reminders.
    pub fn update_medication<Tz: TimeZone>(
        &self,
        medication: &Medication,
        now: &DateTime<Tz>,
    ) -> ServiceResult<ReminderUpdate> {
        if !self.repo.update_medication(medication)? {
            return Err(ServiceError::MedicationNotFound(medication.id.clone()));
        }
        Ok(self.reminders.update_medication_reminders(medication, now))
    }

    /// Delete a medication and cancel its reminders.
    ///
    /// Returns false if the ID was unknown. Reminders are cancelled either
    /// way so a stale notification cannot outlive its record.
    pub fn delete_medication(&self, id: &str) -> ServiceResult<bool> {
        let removed = self.repo.delete_medication(id)?;
        let cancelled = self.reminders.cancel_medication_reminders(id);
        tracing::debug!(medication_id = %id, removed, cancelled, "Deleted medication");
        Ok(removed)
    }

    /// Reset the supply to a full pack.
    pub fn record_refill(&self, id: &str, at: DateTime<Utc>) -> ServiceResult<Medication> {
        let mut medication = self
            .repo
            .get_medication(id)
            .ok_or_else(|| ServiceError::MedicationNotFound(id.to_string()))?;
        medication.refill(at);
        self.repo.update_medication(&medication)?;
        Ok(medication)
    }

    // =========================================================================
    // Dose tracking
    // =========================================================================

    pub fn dose_history(&self) -> Vec<DosageHistory> {
        self.repo.load_dose_history()
    }

    /// Log a dose, taking one pill from the supply when `taken`.
    ///
    /// The entry is always appended. An unknown medication ID is tolerated:
    /// the dose is kept and no supply is touched.
    pub fn record_dose(
        &self,
        medication_id: &str,
        taken: bool,
        timestamp: DateTime<Utc>,
    ) -> ServiceResult<DosageHistory> {
        let entry = DosageHistory::new(medication_id.to_string(), taken, timestamp);
        self.repo.append_dose(&entry)?;

        if !taken {
            return Ok(entry);
        }

        // The dose is already logged; leave an unreadable collection untouched
        let mut medications: Vec<Medication> =
            match self.repo.load_for_update(Collection::Medications) {
                Ok(medications) => medications,
                Err(e) => {
                    tracing::warn!(%medication_id, error = %e, "Supply not updated");
                    return Ok(entry);
                }
            };
        let Some(medication) = medications.iter_mut().find(|m| m.id == medication_id) else {
            tracing::debug!(%medication_id, "Dose recorded for unknown medication");
            return Ok(entry);
        };

        if medication.consume_dose() {
            let updated = medication.clone();
            self.repo.save_medications(&medications)?;
            self.reminders.schedule_refill_reminder(&updated);
        }
        Ok(entry)
    }

    /// Derive today's home-screen state from the stored collections.
    pub fn daily_overview<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DailyOverview {
        let medications = todays_medications(&self.repo.load_medications(), now);
        let todays_history = history_for_day(&self.repo.load_dose_history(), now);

        DailyOverview {
            statuses: dose_statuses(&medications, &todays_history),
            progress: compute_completion(&medications, &todays_history, self.config.expected_doses),
            needs_attention: notification_candidates(&medications, &todays_history),
            medications,
        }
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Wipe both collections and cancel reminders of every stored medication.
    pub fn clear_all_data(&self) -> ServiceResult<()> {
        let medications = self.repo.load_medications();
        self.repo.clear_all()?;
        for medication in &medications {
            self.reminders.cancel_medication_reminders(&medication.id);
        }
        tracing::info!(count = medications.len(), "Cleared all medication data");
        Ok(())
    }
}
