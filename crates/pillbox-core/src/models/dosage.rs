//! Dose history models.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// One recorded dose event (taken or explicitly skipped).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DosageHistory {
    /// Unique entry ID
    pub id: String,
    /// Medication this dose belongs to (not enforced by storage)
    pub medication_id: String,
    /// When the dose was recorded
    pub timestamp: DateTime<Utc>,
    /// false marks a skipped dose
    pub taken: bool,
}

impl DosageHistory {
    /// Create a new history entry with a fresh ID.
    pub fn new(medication_id: String, taken: bool, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            medication_id,
            timestamp,
            taken,
        }
    }

    /// Check if the entry falls on the same local calendar day as `day`.
    pub fn is_on_day<Tz: TimeZone>(&self, day: &DateTime<Tz>) -> bool {
        self.timestamp.with_timezone(&day.timezone()).date_naive() == day.date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_new_entry() {
        let now = Utc::now();
        let entry = DosageHistory::new("med-1".into(), true, now);
        assert_eq!(entry.medication_id, "med-1");
        assert!(entry.taken);
        assert_eq!(entry.id.len(), 36);
        assert_ne!(entry.id, DosageHistory::new("med-1".into(), true, now).id);
    }

    #[test]
    fn test_is_on_day_uses_local_calendar() {
        // 23:30 UTC is already the next day at UTC+2
        let timestamp = Utc.with_ymd_and_hms(2025, 3, 1, 23, 30, 0).unwrap();
        let entry = DosageHistory::new("med-1".into(), true, timestamp);

        let utc_day = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        assert!(entry.is_on_day(&utc_day));

        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let local_day = plus_two.with_ymd_and_hms(2025, 3, 2, 9, 0, 0).unwrap();
        assert!(entry.is_on_day(&local_day));
        assert!(!entry.is_on_day(&plus_two.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()));
    }

    #[test]
    fn test_stored_layout() {
        let timestamp = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let entry = DosageHistory {
            id: "dose-1".into(),
            medication_id: "med-1".into(),
            timestamp,
            taken: false,
        };
        let json: serde_json::Value = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["medicationId"], "med-1");
        assert_eq!(json["taken"], false);
        assert!(json["timestamp"]
            .as_str()
            .unwrap()
            .starts_with("2025-03-01T09:00:00"));
    }
}
