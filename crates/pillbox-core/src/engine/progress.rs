//! Completion counts and per-medication dose status.

use serde::{Deserialize, Serialize};

use crate::config::ExpectedDoses;
use crate::models::{DosageHistory, Medication};

/// Daily completion figures for the progress ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyProgress {
    /// Doses expected across today's medications
    pub expected_total: usize,
    /// Taken entries among today's log
    pub completed: usize,
    /// completed / expected_total * 100, or 0 when nothing is expected
    pub progress_percent: f64,
}

/// Taken/untaken state of one medication for the day view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseStatus {
    pub medication: Medication,
    pub taken: bool,
}

/// Compute today's completion.
///
/// `todays_history` is expected to be pre-filtered to the current day. Every
/// taken entry counts, so the percentage can exceed 100 when more doses are
/// logged than expected.
pub fn compute_completion(
    todays_medications: &[Medication],
    todays_history: &[DosageHistory],
    expected: ExpectedDoses,
) -> DailyProgress {
    let expected_total = match expected {
        ExpectedDoses::PerMedication(per) => todays_medications.len() * per as usize,
        ExpectedDoses::ScheduledTimes => todays_medications
            .iter()
            .map(Medication::daily_dose_count)
            .sum(),
    };
    let completed = todays_history.iter().filter(|entry| entry.taken).count();

    let progress_percent = if expected_total == 0 {
        0.0
    } else {
        completed as f64 / expected_total as f64 * 100.0
    };

    DailyProgress {
        expected_total,
        completed,
        progress_percent,
    }
}

/// Check if any entry marks this medication as taken.
///
/// Not restricted to a day: pass today's entries only to get "taken today".
/// A later skip does not undo an earlier taken entry.
pub fn is_dose_taken(medication_id: &str, history: &[DosageHistory]) -> bool {
    history
        .iter()
        .any(|entry| entry.medication_id == medication_id && entry.taken)
}

/// Taken state for each of today's medications.
pub fn dose_statuses(
    todays_medications: &[Medication],
    todays_history: &[DosageHistory],
) -> Vec<DoseStatus> {
    todays_medications
        .iter()
        .map(|medication| DoseStatus {
            taken: is_dose_taken(&medication.id, todays_history),
            medication: medication.clone(),
        })
        .collect()
}

/// Today's medications with at least one skipped (`taken = false`) entry.
pub fn notification_candidates(
    todays_medications: &[Medication],
    history: &[DosageHistory],
) -> Vec<Medication> {
    todays_medications
        .iter()
        .filter(|medication| {
            history
                .iter()
                .any(|entry| entry.medication_id == medication.id && !entry.taken)
        })
        .cloned()
        .collect()
}
