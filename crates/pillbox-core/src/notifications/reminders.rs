//! Reminder scheduling for medications.
//!
//! Failures of the notification subsystem are logged and swallowed here:
//! a missing reminder never blocks saving a medication or recording a dose.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};

use super::{NotificationData, NotificationRequest, NotificationScheduler, NotificationTrigger};
use crate::config::ReminderPolicy;
use crate::models::{DoseTime, Medication};

/// Outcome of a cancel-then-reschedule pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderUpdate {
    /// Pending notifications removed
    pub cancelled: usize,
    /// Daily dose reminders scheduled
    pub scheduled: Vec<String>,
    /// Refill notification, if one was issued
    pub refill: Option<String>,
}

/// Next local occurrence of `time` at or after `now`.
///
/// A wall-clock time skipped by a DST jump today is taken from tomorrow.
/// Returns `None` only when it is missing on both days.
pub fn next_occurrence<Tz: TimeZone>(time: DoseTime, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    let tz = now.timezone();
    let today_at: NaiveDateTime = now.date_naive().and_hms_opt(time.hour(), time.minute(), 0)?;

    [today_at, today_at + Duration::days(1)]
        .into_iter()
        .filter_map(|local| tz.from_local_datetime(&local).earliest())
        .find(|candidate| candidate >= now)
}

/// Converts medications into platform notifications.
pub struct ReminderScheduler<N> {
    notifier: N,
    policy: ReminderPolicy,
}

impl<N: NotificationScheduler> ReminderScheduler<N> {
    pub fn new(notifier: N, policy: ReminderPolicy) -> Self {
        Self { notifier, policy }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn policy(&self) -> ReminderPolicy {
        self.policy
    }

    /// Schedule repeating daily reminders for a medication's dose times.
    ///
    /// Returns the identifiers that were registered; empty when reminders are
    /// disabled or the platform refused every request.
    pub fn schedule_medication_reminder<Tz: TimeZone>(
        &self,
        medication: &Medication,
        now: &DateTime<Tz>,
    ) -> Vec<String> {
        if !medication.reminder_enabled {
            return Vec::new();
        }

        let times: &[DoseTime] = match self.policy {
            ReminderPolicy::AllTimes => &medication.times,
            ReminderPolicy::FirstTimeOnly => {
                &medication.times[..medication.times.len().min(1)]
            }
        };

        let mut identifiers = Vec::with_capacity(times.len());
        for &time in times {
            let Some(first_fire) = next_occurrence(time, now) else {
                tracing::warn!(
                    medication_id = %medication.id,
                    %time,
                    "Dose time does not exist in local time zone, skipping"
                );
                continue;
            };

            let request = NotificationRequest {
                title: "Medication Reminder".into(),
                body: format!("Time to take {} ({})", medication.name, medication.dosage),
                data: NotificationData::dose(&medication.id),
                trigger: NotificationTrigger::Daily {
                    hour: time.hour(),
                    minute: time.minute(),
                    first_fire: first_fire.with_timezone(&Utc),
                },
            };

            match self.notifier.schedule(request) {
                Ok(identifier) => identifiers.push(identifier),
                Err(e) => tracing::warn!(
                    medication_id = %medication.id,
                    %time,
                    error = %e,
                    "Error scheduling medication reminder"
                ),
            }
        }

        tracing::debug!(
            medication_id = %medication.id,
            count = identifiers.len(),
            "Scheduled medication reminders"
        );
        identifiers
    }

    /// Present a refill notification right away if the supply is low.
    pub fn schedule_refill_reminder(&self, medication: &Medication) -> Option<String> {
        if !medication.needs_refill() {
            return None;
        }

        let request = NotificationRequest {
            title: "Refill Reminder".into(),
            body: format!(
                "Your {} supply is running low. Current supply: {}",
                medication.name, medication.current_supply
            ),
            data: NotificationData::refill(&medication.id),
            trigger: NotificationTrigger::Immediate,
        };

        match self.notifier.schedule(request) {
            Ok(identifier) => Some(identifier),
            Err(e) => {
                tracing::warn!(
                    medication_id = %medication.id,
                    error = %e,
                    "Error scheduling refill reminder"
                );
                None
            }
        }
    }

    /// Cancel every pending notification tagged with `medication_id`.
    ///
    /// Returns how many were cancelled; zero when there was nothing to do.
    pub fn cancel_medication_reminders(&self, medication_id: &str) -> usize {
        let pending = match self.notifier.pending() {
            Ok(pending) => pending,
            Err(e) => {
                tracing::warn!(%medication_id, error = %e, "Error listing scheduled notifications");
                return 0;
            }
        };

        let mut cancelled = 0;
        for notification in pending
            .iter()
            .filter(|n| n.medication_id() == Some(medication_id))
        {
            match self.notifier.cancel(&notification.identifier) {
                Ok(()) => cancelled += 1,
                Err(e) => tracing::warn!(
                    %medication_id,
                    identifier = %notification.identifier,
                    error = %e,
                    "Error canceling medication reminder"
                ),
            }
        }
        cancelled
    }

    /// Cancel existing reminders, then schedule fresh ones.
    pub fn update_medication_reminders<Tz: TimeZone>(
        &self,
        medication: &Medication,
        now: &DateTime<Tz>,
    ) -> ReminderUpdate {
        let cancelled = self.cancel_medication_reminders(&medication.id);
        let scheduled = self.schedule_medication_reminder(medication, now);
        let refill = self.schedule_refill_reminder(medication);

        ReminderUpdate {
            cancelled,
            scheduled,
            refill,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TreatmentDuration;
    use crate::notifications::{InMemoryScheduler, NotificationKind};
    use chrono::{FixedOffset, LocalResult, NaiveDate, Offset};

    /// US Eastern around the 2025-03-09 spring-forward jump (02:00 -> 03:00).
    #[derive(Debug, Clone, Copy)]
    struct SpringForward;

    impl SpringForward {
        fn est() -> FixedOffset {
            FixedOffset::west_opt(5 * 3600).unwrap()
        }

        fn edt() -> FixedOffset {
            FixedOffset::west_opt(4 * 3600).unwrap()
        }

        fn jump_day() -> NaiveDate {
            NaiveDate::from_ymd_opt(2025, 3, 9).unwrap()
        }
    }

    impl TimeZone for SpringForward {
        type Offset = FixedOffset;

        fn from_offset(_offset: &FixedOffset) -> Self {
            SpringForward
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            if *local < Self::jump_day() {
                LocalResult::Single(Self::est())
            } else {
                LocalResult::Single(Self::edt())
            }
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            let jump = Self::jump_day().and_hms_opt(2, 0, 0).unwrap();
            if *local < jump {
                LocalResult::Single(Self::est())
            } else if *local < jump + Duration::hours(1) {
                LocalResult::None
            } else {
                LocalResult::Single(Self::edt())
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            if *utc < Self::jump_day() {
                Self::est()
            } else {
                Self::edt()
            }
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            if *utc < Self::jump_day().and_hms_opt(7, 0, 0).unwrap() {
                Self::est()
            } else {
                Self::edt()
            }
        }
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, hour, minute, 0).unwrap()
    }

    fn make_medication(times: &[&str]) -> Medication {
        let mut med = Medication::new(
            "Lisinopril".into(),
            "10mg".into(),
            times.iter().map(|t| t.parse().unwrap()).collect(),
            at(0, 0),
            TreatmentDuration::Ongoing,
        );
        med.id = "med-1".into();
        med
    }

    fn scheduler(policy: ReminderPolicy) -> ReminderScheduler<InMemoryScheduler> {
        ReminderScheduler::new(InMemoryScheduler::new(), policy)
    }

    #[test]
    fn test_next_occurrence_later_today() {
        let time = "21:00".parse().unwrap();
        assert_eq!(next_occurrence(time, &at(9, 0)), Some(at(21, 0)));
    }

    #[test]
    fn test_next_occurrence_rolls_to_tomorrow() {
        let time = "09:00".parse().unwrap();
        let expected = Utc.with_ymd_and_hms(2025, 3, 2, 9, 0, 0).unwrap();
        assert_eq!(next_occurrence(time, &at(9, 1)), Some(expected));

        // Exactly now is not in the past
        assert_eq!(next_occurrence(time, &at(9, 0)), Some(at(9, 0)));
    }

    #[test]
    fn test_next_occurrence_local_zone() {
        let zone = FixedOffset::west_opt(5 * 3600).unwrap();
        let now = zone.with_ymd_and_hms(2025, 3, 1, 22, 0, 0).unwrap();
        let next = next_occurrence("08:00".parse().unwrap(), &now).unwrap();
        assert_eq!(next, zone.with_ymd_and_hms(2025, 3, 2, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_next_occurrence_skipped_by_dst_rolls_to_tomorrow() {
        let time: DoseTime = "02:30".parse().unwrap();
        let tomorrow = SpringForward.with_ymd_and_hms(2025, 3, 10, 2, 30, 0).unwrap();

        let before_jump = SpringForward.with_ymd_and_hms(2025, 3, 9, 1, 0, 0).unwrap();
        assert_eq!(next_occurrence(time, &before_jump), Some(tomorrow));

        let after_jump = SpringForward.with_ymd_and_hms(2025, 3, 9, 12, 0, 0).unwrap();
        assert_eq!(next_occurrence(time, &after_jump), Some(tomorrow));
        assert_eq!(tomorrow.offset().fix(), SpringForward::edt());

        // Times outside the gap still fire the same day
        let later = next_occurrence("03:30".parse().unwrap(), &before_jump).unwrap();
        assert_eq!(later.naive_local().date(), SpringForward::jump_day());
    }

    #[test]
    fn test_dst_gap_time_is_still_scheduled() {
        let reminders = scheduler(ReminderPolicy::AllTimes);
        let med = make_medication(&["02:30"]);
        let now = SpringForward.with_ymd_and_hms(2025, 3, 9, 1, 0, 0).unwrap();

        assert_eq!(reminders.schedule_medication_reminder(&med, &now).len(), 1);
    }

    #[test]
    fn test_schedules_every_time() {
        let reminders = scheduler(ReminderPolicy::AllTimes);
        let med = make_medication(&["09:00", "15:00", "21:00"]);

        let ids = reminders.schedule_medication_reminder(&med, &at(12, 0));
        assert_eq!(ids.len(), 3);

        let pending = reminders.notifier().pending_requests();
        let hours: Vec<u32> = pending
            .iter()
            .map(|(_, r)| match r.trigger {
                NotificationTrigger::Daily { hour, .. } => hour,
                NotificationTrigger::Immediate => panic!("dose reminder must be daily"),
            })
            .collect();
        assert_eq!(hours, vec![9, 15, 21]);
        assert_eq!(pending[0].1.body, "Time to take Lisinopril (10mg)");
        assert_eq!(pending[0].1.data, NotificationData::dose("med-1"));
    }

    #[test]
    fn test_first_time_only_policy() {
        let reminders = scheduler(ReminderPolicy::FirstTimeOnly);
        let med = make_medication(&["09:00", "21:00"]);

        let ids = reminders.schedule_medication_reminder(&med, &at(12, 0));
        assert_eq!(ids.len(), 1);

        let pending = reminders.notifier().pending_requests();
        assert!(matches!(
            pending[0].1.trigger,
            NotificationTrigger::Daily { hour: 9, minute: 0, .. }
        ));
    }

    #[test]
    fn test_disabled_reminders_schedule_nothing() {
        let reminders = scheduler(ReminderPolicy::AllTimes);
        let mut med = make_medication(&["09:00"]);
        med.reminder_enabled = false;

        assert!(reminders.schedule_medication_reminder(&med, &at(8, 0)).is_empty());
        assert!(reminders.notifier().pending_requests().is_empty());
    }

    #[test]
    fn test_refill_reminder_threshold() {
        let reminders = scheduler(ReminderPolicy::AllTimes);
        let mut med = make_medication(&["09:00"]);
        med.refill_reminder = true;
        med.refill_at = 5;
        med.current_supply = 6;
        assert_eq!(reminders.schedule_refill_reminder(&med), None);

        med.current_supply = 5;
        assert!(reminders.schedule_refill_reminder(&med).is_some());

        let presented = reminders.notifier().presented();
        assert_eq!(presented.len(), 1);
        assert_eq!(presented[0].data.kind, Some(NotificationKind::Refill));
        assert_eq!(
            presented[0].body,
            "Your Lisinopril supply is running low. Current supply: 5"
        );

        med.refill_reminder = false;
        assert_eq!(reminders.schedule_refill_reminder(&med), None);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let reminders = scheduler(ReminderPolicy::AllTimes);
        let med = make_medication(&["09:00", "21:00"]);
        let mut other = make_medication(&["10:00"]);
        other.id = "med-2".into();

        reminders.schedule_medication_reminder(&med, &at(8, 0));
        reminders.schedule_medication_reminder(&other, &at(8, 0));

        assert_eq!(reminders.cancel_medication_reminders("med-1"), 2);
        assert_eq!(reminders.cancel_medication_reminders("med-1"), 0);

        let pending = reminders.notifier().pending_requests();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].1.data.medication_id, "med-2");
    }

    #[test]
    fn test_update_replaces_reminders() {
        let reminders = scheduler(ReminderPolicy::AllTimes);
        let mut med = make_medication(&["09:00", "21:00"]);
        reminders.schedule_medication_reminder(&med, &at(8, 0));

        med.times = vec!["07:30".parse().unwrap()];
        let update = reminders.update_medication_reminders(&med, &at(8, 0));

        assert_eq!(update.cancelled, 2);
        assert_eq!(update.scheduled.len(), 1);
        assert_eq!(update.refill, None);
        assert_eq!(reminders.notifier().pending_requests().len(), 1);
    }
}
