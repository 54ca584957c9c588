//! Medication models.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::schedule::{DoseTime, TreatmentDuration};

/// A user-defined treatment record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    /// Unique ID - generated locally
    pub id: String,
    /// Medication name
    pub name: String,
    /// Free-text dosage (e.g., "100mg")
    pub dosage: String,
    /// Daily dose slots, one per expected dose
    pub times: Vec<DoseTime>,
    /// Start of the course
    pub start_date: DateTime<Utc>,
    /// Course length
    pub duration: TreatmentDuration,
    /// Display tag
    pub color: String,
    /// Whether dose reminders should be scheduled
    pub reminder_enabled: bool,
    /// Pills on hand
    pub current_supply: u32,
    /// Pills in a full pack
    pub total_supply: u32,
    /// Supply level at or below which a refill reminder fires
    pub refill_at: u32,
    /// Whether refill reminders are enabled
    pub refill_reminder: bool,
    /// Last time the supply was topped up
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_refill_date: Option<DateTime<Utc>>,
}

impl Medication {
    /// Create a new medication with required fields.
    pub fn new(
        name: String,
        dosage: String,
        times: Vec<DoseTime>,
        start_date: DateTime<Utc>,
        duration: TreatmentDuration,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            dosage,
            times,
            start_date,
            duration,
            color: String::new(),
            reminder_enabled: true,
            current_supply: 0,
            total_supply: 0,
            refill_at: 0,
            refill_reminder: false,
            last_refill_date: None,
        }
    }

    /// Number of doses the schedule asks for each day.
    pub fn daily_dose_count(&self) -> usize {
        self.times.len()
    }

    /// Last instant of the course.
    ///
    /// `None` when ongoing, or when the course runs past the last
    /// representable date; both mean the course never ends.
    pub fn end_date(&self) -> Option<DateTime<Utc>> {
        let window = Duration::try_milliseconds(self.duration.window_ms()?)?;
        self.start_date.checked_add_signed(window)
    }

    /// Check whether the course covers the given instant.
    ///
    /// Both bounds are inclusive and days are a fixed 86 400 000 ms, so DST
    /// shifts are not taken into account.
    pub fn is_active_on<Tz: TimeZone>(&self, instant: &DateTime<Tz>) -> bool {
        let instant = instant.with_timezone(&Utc);
        if instant < self.start_date {
            return false;
        }
        match self.end_date() {
            Some(end) => instant <= end,
            None => true,
        }
    }

    /// Check if the supply is at or below the refill threshold.
    pub fn is_supply_low(&self) -> bool {
        self.current_supply <= self.refill_at
    }

    /// Check if a refill reminder should be shown.
    pub fn needs_refill(&self) -> bool {
        self.refill_reminder && self.is_supply_low()
    }

    /// Take one pill from the supply. Returns false when already empty.
    pub fn consume_dose(&mut self) -> bool {
        if self.current_supply > 0 {
            self.current_supply -= 1;
            true
        } else {
            false
        }
    }

    /// Top the supply back up to a full pack.
    pub fn refill(&mut self, at: DateTime<Utc>) {
        self.current_supply = self.total_supply;
        self.last_refill_date = Some(at);
    }
}
