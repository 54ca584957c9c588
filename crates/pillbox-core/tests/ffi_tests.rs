//! Exported API tests, with the host notifier implemented in Rust.

use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use pillbox_core::{
    open_pillbox, open_pillbox_in_memory, FfiFrequency, FfiMedicationDraft,
    FfiNotificationRequest, FfiScheduledNotification, PillboxError, PlatformNotifier,
};

#[derive(Default)]
struct HostState {
    next_id: u32,
    pending: Vec<(String, FfiNotificationRequest)>,
}

#[derive(Clone, Default)]
struct RecordingNotifier {
    state: Arc<Mutex<HostState>>,
}

impl RecordingNotifier {
    fn pending(&self) -> Vec<FfiNotificationRequest> {
        self.state
            .lock()
            .unwrap()
            .pending
            .iter()
            .map(|(_, r)| r.clone())
            .collect()
    }
}

impl PlatformNotifier for RecordingNotifier {
    fn schedule(&self, request: FfiNotificationRequest) -> Result<String, PillboxError> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("host-{}", state.next_id);
        if request.hour.is_some() {
            state.pending.push((id.clone(), request));
        }
        Ok(id)
    }

    fn cancel(&self, identifier: String) -> Result<(), PillboxError> {
        self.state
            .lock()
            .unwrap()
            .pending
            .retain(|(id, _)| *id != identifier);
        Ok(())
    }

    fn list_scheduled(&self) -> Result<Vec<FfiScheduledNotification>, PillboxError> {
        let state = self.state.lock().unwrap();
        let mut scheduled: Vec<FfiScheduledNotification> = state
            .pending
            .iter()
            .map(|(id, r)| FfiScheduledNotification {
                identifier: id.clone(),
                data_json: Some(r.data_json.clone()),
            })
            .collect();

        // Notifications from elsewhere in the app, without our payload
        scheduled.push(FfiScheduledNotification {
            identifier: "marketing".into(),
            data_json: None,
        });
        Ok(scheduled)
    }
}

fn make_draft(name: &str) -> FfiMedicationDraft {
    FfiMedicationDraft {
        name: name.into(),
        dosage: "250mg".into(),
        frequency: FfiFrequency::TwiceDaily,
        times: None,
        start_date: (Utc::now() - Duration::days(1)).to_rfc3339(),
        duration_days: -1,
        reminder_enabled: true,
        refill_reminder: false,
        current_supply: Some(10),
        total_supply: Some(60),
        refill_at: Some(5),
        color: None,
    }
}

#[test]
fn test_add_and_delete_through_ffi() {
    let notifier = RecordingNotifier::default();
    let core = open_pillbox_in_memory(None, Box::new(notifier.clone())).unwrap();

    let med = core.add_medication(make_draft("Cephalexin")).unwrap();
    assert_eq!(med.times, vec!["09:00", "21:00"]);
    assert_eq!(med.duration_days, -1);

    let pending = notifier.pending();
    assert_eq!(pending.len(), 2);
    assert_eq!(
        pending[0].data_json,
        format!(r#"{{"medicationId":"{}"}}"#, med.id)
    );
    assert_eq!(pending[0].title, "Medication Reminder");

    assert!(core.delete_medication(med.id.clone()).unwrap());
    assert!(notifier.pending().is_empty());
    assert!(core.get_medication(med.id).unwrap().is_none());
}

#[test]
fn test_dose_and_overview_through_ffi() {
    let notifier = RecordingNotifier::default();
    let core = open_pillbox_in_memory(None, Box::new(notifier)).unwrap();

    let med = core.add_medication(make_draft("Cephalexin")).unwrap();
    core.record_dose(med.id.clone(), true).unwrap();

    let overview = core.todays_overview().unwrap();
    assert_eq!(overview.medications.len(), 1);
    assert_eq!(overview.expected_total, 2);
    assert_eq!(overview.completed, 1);
    assert_eq!(overview.progress_percent, 50.0);
    assert!(overview.statuses[0].taken);

    let updated = core.get_medication(med.id).unwrap().unwrap();
    assert_eq!(updated.current_supply, 9);
}

#[test]
fn test_very_long_course_keeps_core_usable() {
    let core = open_pillbox_in_memory(None, Box::new(RecordingNotifier::default())).unwrap();

    let mut draft = make_draft("Levothyroxine");
    draft.duration_days = 200_000_000;
    let med = core.add_medication(draft).unwrap();
    assert_eq!(med.duration_days, 200_000_000);

    let overview = core.todays_overview().unwrap();
    assert_eq!(overview.medications.len(), 1);
    assert_eq!(core.list_medications().unwrap().len(), 1);
}

#[test]
fn test_invalid_draft_rejected() {
    let core = open_pillbox_in_memory(None, Box::new(RecordingNotifier::default())).unwrap();

    let mut draft = make_draft("");
    assert!(matches!(
        core.add_medication(draft.clone()),
        Err(PillboxError::InvalidInput(_))
    ));

    draft.name = "Cephalexin".into();
    draft.times = Some(vec!["9am".into()]);
    assert!(matches!(
        core.add_medication(draft),
        Err(PillboxError::InvalidInput(_))
    ));
    assert!(core.list_medications().unwrap().is_empty());
}

#[test]
fn test_config_applied() {
    let notifier = RecordingNotifier::default();
    let core = open_pillbox_in_memory(
        Some("reminder_policy = \"first_time_only\"".into()),
        Box::new(notifier.clone()),
    )
    .unwrap();

    core.add_medication(make_draft("Cephalexin")).unwrap();
    assert_eq!(notifier.pending().len(), 1);

    assert!(matches!(
        open_pillbox_in_memory(Some("nonsense = [".into()), Box::new(notifier)),
        Err(PillboxError::ConfigError(_))
    ));
}

#[test]
fn test_update_unknown_medication() {
    let core = open_pillbox_in_memory(None, Box::new(RecordingNotifier::default())).unwrap();
    let med = core.add_medication(make_draft("Cephalexin")).unwrap();
    core.clear_all_data().unwrap();

    assert!(matches!(
        core.update_medication(med),
        Err(PillboxError::NotFound(_))
    ));
}

#[test]
fn test_open_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pillbox.db").to_string_lossy().to_string();

    let core = open_pillbox(path.clone(), None, Box::new(RecordingNotifier::default())).unwrap();
    let med = core.add_medication(make_draft("Cephalexin")).unwrap();
    drop(core);

    let reopened = open_pillbox(path, None, Box::new(RecordingNotifier::default())).unwrap();
    let refilled = reopened.record_refill(med.id).unwrap();
    assert_eq!(refilled.current_supply, 60);
    assert!(refilled.last_refill_date.is_some());
}
