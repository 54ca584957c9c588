//! Selecting what belongs to the current day.

use chrono::{DateTime, TimeZone};

use crate::models::{DosageHistory, Medication};

/// Medications whose course covers `today`, in stored order.
pub fn todays_medications<Tz: TimeZone>(
    medications: &[Medication],
    today: &DateTime<Tz>,
) -> Vec<Medication> {
    medications
        .iter()
        .filter(|m| m.is_active_on(today))
        .cloned()
        .collect()
}

/// Log entries recorded on the same local calendar day as `today`.
pub fn history_for_day<Tz: TimeZone>(
    history: &[DosageHistory],
    today: &DateTime<Tz>,
) -> Vec<DosageHistory> {
    history
        .iter()
        .filter(|entry| entry.is_on_day(today))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TreatmentDuration;
    use chrono::{Duration, Utc};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
    }

    fn make_medication(name: &str, start_date: DateTime<Utc>, duration: TreatmentDuration) -> Medication {
        Medication::new(
            name.into(),
            "1 tablet".into(),
            vec!["09:00".parse().unwrap()],
            start_date,
            duration,
        )
    }

    #[test]
    fn test_filters_and_keeps_order() {
        let meds = vec![
            make_medication("Ongoing", start(), TreatmentDuration::Ongoing),
            make_medication("Finished", start() - Duration::days(30), TreatmentDuration::Days(7)),
            make_medication("Week", start(), TreatmentDuration::Days(7)),
            make_medication("Future", start() + Duration::days(3), TreatmentDuration::Days(7)),
        ];

        let today = start() + Duration::days(2);
        let names: Vec<String> = todays_medications(&meds, &today)
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["Ongoing", "Week"]);
    }

    #[test]
    fn test_upper_bound_inclusive() {
        let meds = vec![make_medication("Week", start(), TreatmentDuration::Days(7))];
        let boundary = start() + Duration::milliseconds(7 * 86_400_000);

        assert_eq!(todays_medications(&meds, &boundary).len(), 1);
        assert!(todays_medications(&meds, &(boundary + Duration::milliseconds(1))).is_empty());
    }

    #[test]
    fn test_ongoing_not_before_start() {
        let meds = vec![make_medication("Ongoing", start(), TreatmentDuration::Ongoing)];
        assert!(todays_medications(&meds, &(start() - Duration::seconds(1))).is_empty());
        assert_eq!(todays_medications(&meds, &(start() + Duration::days(3650))).len(), 1);
    }

    #[test]
    fn test_history_for_day() {
        let history = vec![
            DosageHistory::new("a".into(), true, start()),
            DosageHistory::new("a".into(), true, start() + Duration::days(1)),
            DosageHistory::new("b".into(), false, start() + Duration::hours(10)),
        ];

        let today = history_for_day(&history, &start());
        assert_eq!(today.len(), 2);
        assert!(today.iter().all(|e| e.timestamp.date_naive() == start().date_naive()));
    }
}
