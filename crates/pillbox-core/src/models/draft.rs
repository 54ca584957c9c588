//! Add-medication form model with frequency and duration presets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::medication::Medication;
use super::schedule::{DoseTime, TreatmentDuration};

/// Display colours handed out to new medications.
pub const MEDICATION_COLORS: [&str; 5] = ["#4CAF50", "#2196F3", "#FF9800", "#E91E63", "#9C27B0"];

/// Form validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DraftError {
    #[error("Medication name is required")]
    MissingName,

    #[error("Dosage is required")]
    MissingDosage,

    #[error("At least one dose time is required")]
    MissingTimes,

    #[error("Dose time {0} is listed more than once")]
    DuplicateTime(DoseTime),

    #[error("Current supply is required for refill reminders")]
    MissingSupply,

    #[error("Refill threshold ({refill_at}) exceeds total supply ({total_supply})")]
    RefillThreshold { refill_at: u32, total_supply: u32 },
}

/// How often a medication is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    OnceDaily,
    TwiceDaily,
    ThreeTimesDaily,
    FourTimesDaily,
    AsNeeded,
}

impl Frequency {
    pub const ALL: [Frequency; 5] = [
        Frequency::OnceDaily,
        Frequency::TwiceDaily,
        Frequency::ThreeTimesDaily,
        Frequency::FourTimesDaily,
        Frequency::AsNeeded,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Frequency::OnceDaily => "Once daily",
            Frequency::TwiceDaily => "Twice daily",
            Frequency::ThreeTimesDaily => "Three times daily",
            Frequency::FourTimesDaily => "Four times daily",
            Frequency::AsNeeded => "As needed",
        }
    }

    /// Default dose times for this frequency.
    pub fn default_times(&self) -> Vec<DoseTime> {
        let slots: &[(u32, u32)] = match self {
            Frequency::OnceDaily => &[(9, 0)],
            Frequency::TwiceDaily => &[(9, 0), (21, 0)],
            Frequency::ThreeTimesDaily => &[(9, 0), (15, 0), (21, 0)],
            Frequency::FourTimesDaily => &[(9, 0), (13, 0), (17, 0), (21, 0)],
            Frequency::AsNeeded => &[],
        };
        slots
            .iter()
            .filter_map(|&(hour, minute)| DoseTime::new(hour, minute).ok())
            .collect()
    }
}

/// Course length choices offered by the form.
pub const DURATION_PRESETS: [(&str, TreatmentDuration); 5] = [
    ("7 days", TreatmentDuration::Days(7)),
    ("14 days", TreatmentDuration::Days(14)),
    ("30 days", TreatmentDuration::Days(30)),
    ("90 days", TreatmentDuration::Days(90)),
    ("Ongoing", TreatmentDuration::Ongoing),
];

/// Unvalidated add-medication form state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationDraft {
    pub name: String,
    pub dosage: String,
    pub frequency: Frequency,
    pub times: Vec<DoseTime>,
    pub start_date: DateTime<Utc>,
    pub duration: TreatmentDuration,
    pub reminder_enabled: bool,
    pub refill_reminder: bool,
    pub current_supply: Option<u32>,
    pub total_supply: Option<u32>,
    pub refill_at: Option<u32>,
    pub color: Option<String>,
}

impl MedicationDraft {
    /// Start a draft with the form's defaults (once daily, reminders on).
    pub fn new(start_date: DateTime<Utc>) -> Self {
        Self {
            name: String::new(),
            dosage: String::new(),
            frequency: Frequency::OnceDaily,
            times: Frequency::OnceDaily.default_times(),
            start_date,
            duration: TreatmentDuration::Ongoing,
            reminder_enabled: true,
            refill_reminder: false,
            current_supply: None,
            total_supply: None,
            refill_at: None,
            color: None,
        }
    }

    /// Switch frequency, replacing the times with the preset ones.
    pub fn set_frequency(&mut self, frequency: Frequency) {
        self.frequency = frequency;
        self.times = frequency.default_times();
    }

    /// Check the form for errors.
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.name.trim().is_empty() {
            return Err(DraftError::MissingName);
        }
        if self.dosage.trim().is_empty() {
            return Err(DraftError::MissingDosage);
        }
        if self.times.is_empty() && self.frequency != Frequency::AsNeeded {
            return Err(DraftError::MissingTimes);
        }

        let mut seen = Vec::with_capacity(self.times.len());
        for time in &self.times {
            if seen.contains(time) {
                return Err(DraftError::DuplicateTime(*time));
            }
            seen.push(*time);
        }

        if self.refill_reminder && self.current_supply.is_none() {
            return Err(DraftError::MissingSupply);
        }

        let total_supply = self.total_supply.or(self.current_supply).unwrap_or(0);
        if let Some(refill_at) = self.refill_at {
            if refill_at > total_supply {
                return Err(DraftError::RefillThreshold {
                    refill_at,
                    total_supply,
                });
            }
        }
        Ok(())
    }

    /// Validate and build the medication record with a fresh ID.
    pub fn into_medication(self) -> Result<Medication, DraftError> {
        self.validate()?;

        let mut medication = Medication::new(
            self.name.trim().to_string(),
            self.dosage.trim().to_string(),
            self.times,
            self.start_date,
            self.duration,
        );

        let current_supply = self.current_supply.unwrap_or(0);
        medication.color = self.color.unwrap_or_else(|| pick_color(&medication.id));
        medication.reminder_enabled = self.reminder_enabled;
        medication.refill_reminder = self.refill_reminder;
        medication.current_supply = current_supply;
        medication.total_supply = self.total_supply.unwrap_or(current_supply);
        medication.refill_at = self.refill_at.unwrap_or(0);
        Ok(medication)
    }
}

/// Pick a palette colour from the medication ID.
fn pick_color(id: &str) -> String {
    let index = id.bytes().fold(0usize, |acc, b| acc.wrapping_add(b as usize));
    MEDICATION_COLORS[index % MEDICATION_COLORS.len()].to_string()
}
