//! Pillbox Core Library
//!
//! Local-first medication reminders: medication records with dosing
//! schedules, a dose log, daily completion tracking and refill alerts.
//!
//! # Architecture
//!
//! ```text
//!        UI event (medication saved, dose marked, refill)
//!                              │
//!                   ┌──────────▼──────────┐
//!                   │  MedicationService  │
//!                   └────┬───────────┬────┘
//!                        │           │
//!          ┌─────────────▼──┐     ┌──▼─────────────────┐
//!          │   Repository   │     │ ReminderScheduler  │
//!          │ @medications   │     │ cancel → schedule  │
//!          │ @dosage_history│     └──┬─────────────────┘
//!          └──────┬─────────┘        │
//!                 ▼                  ▼
//!          KeyValueStore      NotificationScheduler
//!          (SQLite / memory)  (platform callback)
//! ```
//!
//! # Core Principle
//!
//! **Status is always derived.** Nothing is cached between calls; taken,
//! skipped and progress are recomputed from the stored dose log.
//!
//! # Modules
//!
//! - [`models`]: Domain types (Medication, DosageHistory, DoseTime, etc.)
//! - [`store`]: Key-value persistence and the collection repository
//! - [`notifications`]: Platform notification boundary and reminder scheduling
//! - [`engine`]: Active-set, completion and badge logic plus the service
//! - [`config`]: TOML configuration
//! - [`logging`]: Optional console logging setup

pub mod config;
pub mod engine;
pub mod logging;
pub mod models;
pub mod notifications;
pub mod store;

// Re-export commonly used types
pub use config::{ExpectedDoses, PillboxConfig, ReminderPolicy};
pub use engine::{DailyOverview, DailyProgress, DoseStatus, MedicationService};
pub use models::{
    DosageHistory, DoseTime, Frequency, Medication, MedicationDraft, TreatmentDuration,
};
pub use notifications::{NotificationScheduler, ReminderScheduler};
pub use store::{KeyValueStore, Repository, SqliteStore};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use notifications::{
    ChannelImportance, DeviceOs, NotificationChannel, NotificationData, NotificationKind,
    NotificationPlatform, NotificationPresentation, NotificationRequest, NotificationTrigger,
    NotifyError, NotifyResult, PermissionStatus, ScheduledNotification,
};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum PillboxError {
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Notification error: {0}")]
    NotificationError(String),
}

impl From<store::StoreError> for PillboxError {
    fn from(e: store::StoreError) -> Self {
        PillboxError::StorageError(e.to_string())
    }
}

impl From<engine::ServiceError> for PillboxError {
    fn from(e: engine::ServiceError) -> Self {
        match e {
            engine::ServiceError::MedicationNotFound(id) => PillboxError::NotFound(id),
            engine::ServiceError::Store(e) => e.into(),
        }
    }
}

impl From<config::ConfigError> for PillboxError {
    fn from(e: config::ConfigError) -> Self {
        PillboxError::ConfigError(e.to_string())
    }
}

impl From<models::DraftError> for PillboxError {
    fn from(e: models::DraftError) -> Self {
        PillboxError::InvalidInput(e.to_string())
    }
}

impl From<models::ScheduleError> for PillboxError {
    fn from(e: models::ScheduleError) -> Self {
        PillboxError::InvalidInput(e.to_string())
    }
}

impl From<uniffi::UnexpectedUniFFICallbackError> for PillboxError {
    fn from(e: uniffi::UnexpectedUniFFICallbackError) -> Self {
        PillboxError::NotificationError(e.reason)
    }
}

impl<T> From<std::sync::PoisonError<T>> for PillboxError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        PillboxError::StorageError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Platform Callbacks (implemented by the host app)
// =========================================================================

/// Device notification scheduler.
#[uniffi::export(callback_interface)]
pub trait PlatformNotifier: Send + Sync {
    /// Register a notification and return its identifier.
    fn schedule(&self, request: FfiNotificationRequest) -> Result<String, PillboxError>;

    /// Cancel a pending notification.
    fn cancel(&self, identifier: String) -> Result<(), PillboxError>;

    /// List pending notifications with their raw payloads.
    fn list_scheduled(&self) -> Result<Vec<FfiScheduledNotification>, PillboxError>;
}

/// Device permission and push-token subsystem.
#[uniffi::export(callback_interface)]
pub trait PlatformPermissions: Send + Sync {
    fn is_android(&self) -> bool;

    fn permission_status(&self) -> Result<FfiPermissionStatus, PillboxError>;

    fn request_permission(&self) -> Result<FfiPermissionStatus, PillboxError>;

    fn push_token(&self) -> Result<String, PillboxError>;

    fn set_channel(&self, channel: FfiNotificationChannel) -> Result<(), PillboxError>;
}

/// Adapts the host notifier to [`NotificationScheduler`].
pub struct ForeignNotifier {
    inner: Box<dyn PlatformNotifier>,
}

impl NotificationScheduler for ForeignNotifier {
    fn schedule(&self, request: NotificationRequest) -> NotifyResult<String> {
        let request = FfiNotificationRequest::try_from(request)?;
        self.inner
            .schedule(request)
            .map_err(|e| NotifyError::Platform(e.to_string()))
    }

    fn cancel(&self, identifier: &str) -> NotifyResult<()> {
        self.inner
            .cancel(identifier.to_string())
            .map_err(|e| NotifyError::Platform(e.to_string()))
    }

    fn pending(&self) -> NotifyResult<Vec<ScheduledNotification>> {
        let scheduled = self
            .inner
            .list_scheduled()
            .map_err(|e| NotifyError::Platform(e.to_string()))?;

        Ok(scheduled
            .into_iter()
            .map(|n| ScheduledNotification {
                data: n
                    .data_json
                    .and_then(|json| NotificationData::from_json(&json).ok()),
                identifier: n.identifier,
            })
            .collect())
    }
}

struct ForeignPermissions {
    inner: Box<dyn PlatformPermissions>,
}

impl NotificationPlatform for ForeignPermissions {
    fn os(&self) -> DeviceOs {
        if self.inner.is_android() {
            DeviceOs::Android
        } else {
            DeviceOs::Ios
        }
    }

    fn permission_status(&self) -> NotifyResult<PermissionStatus> {
        self.inner
            .permission_status()
            .map(Into::into)
            .map_err(|e| NotifyError::Platform(e.to_string()))
    }

    fn request_permission(&self) -> NotifyResult<PermissionStatus> {
        self.inner
            .request_permission()
            .map(Into::into)
            .map_err(|e| NotifyError::Platform(e.to_string()))
    }

    fn push_token(&self) -> NotifyResult<String> {
        self.inner
            .push_token()
            .map_err(|e| NotifyError::Platform(e.to_string()))
    }

    fn set_channel(&self, channel: &NotificationChannel) -> NotifyResult<()> {
        self.inner
            .set_channel(channel.clone().into())
            .map_err(|e| NotifyError::Platform(e.to_string()))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a medication store at the given path.
#[uniffi::export]
pub fn open_pillbox(
    path: String,
    config_toml: Option<String>,
    notifier: Box<dyn PlatformNotifier>,
) -> Result<Arc<PillboxCore>, PillboxError> {
    let store = SqliteStore::open(&path)?;
    PillboxCore::build(store, config_toml, notifier)
}

/// Create an in-memory store (for testing and previews).
#[uniffi::export]
pub fn open_pillbox_in_memory(
    config_toml: Option<String>,
    notifier: Box<dyn PlatformNotifier>,
) -> Result<Arc<PillboxCore>, PillboxError> {
    let store = SqliteStore::open_in_memory()?;
    PillboxCore::build(store, config_toml, notifier)
}

/// Install console logging. Returns false if logging was already set up.
#[uniffi::export]
pub fn init_logging(filter: Option<String>) -> bool {
    logging::init_logging(filter.as_deref())
}

/// Ask for notification permission and return the push token.
#[uniffi::export]
pub fn register_for_notifications(platform: Box<dyn PlatformPermissions>) -> Option<String> {
    notifications::register_for_notifications(&ForeignPermissions { inner: platform })
}

/// Foreground presentation settings installed at startup.
#[uniffi::export]
pub fn notification_presentation() -> FfiPresentation {
    notifications::notification_handler()
        .cloned()
        .unwrap_or_default()
        .into()
}

/// Frequency choices for the add-medication form, with their preset times.
#[uniffi::export]
pub fn frequency_presets() -> Vec<FfiFrequencyPreset> {
    Frequency::ALL
        .iter()
        .map(|&frequency| FfiFrequencyPreset {
            frequency: frequency.into(),
            label: frequency.label().to_string(),
            times: frequency
                .default_times()
                .iter()
                .map(ToString::to_string)
                .collect(),
        })
        .collect()
}

/// Course length choices for the add-medication form.
#[uniffi::export]
pub fn duration_presets() -> Vec<FfiDurationPreset> {
    models::DURATION_PRESETS
        .iter()
        .map(|&(label, duration)| FfiDurationPreset {
            label: label.to_string(),
            duration_days: duration.into(),
        })
        .collect()
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe service wrapper for FFI.
///
/// Every call holds the lock for its whole read-modify-write cycle, so two
/// overlapping dose recordings cannot lose a supply update.
#[derive(uniffi::Object)]
pub struct PillboxCore {
    service: Mutex<MedicationService<SqliteStore, ForeignNotifier>>,
}

impl PillboxCore {
    fn build(
        store: SqliteStore,
        config_toml: Option<String>,
        notifier: Box<dyn PlatformNotifier>,
    ) -> Result<Arc<Self>, PillboxError> {
        let config = match config_toml {
            Some(source) => PillboxConfig::from_toml_str(&source)?,
            None => PillboxConfig::default(),
        };
        notifications::configure_notification_handler(config.presentation.clone());

        let service = MedicationService::new(store, ForeignNotifier { inner: notifier }, config);
        Ok(Arc::new(Self {
            service: Mutex::new(service),
        }))
    }
}

#[uniffi::export]
impl PillboxCore {
    // =========================================================================
    // Medication Operations
    // =========================================================================

    /// List all medications.
    pub fn list_medications(&self) -> Result<Vec<FfiMedication>, PillboxError> {
        let service = self.service.lock()?;
        Ok(service.list_medications().into_iter().map(Into::into).collect())
    }

    /// Get a medication by ID.
    pub fn get_medication(&self, id: String) -> Result<Option<FfiMedication>, PillboxError> {
        let service = self.service.lock()?;
        Ok(service.get_medication(&id).map(Into::into))
    }

    /// Validate the add-medication form, save it and schedule reminders.
    pub fn add_medication(&self, draft: FfiMedicationDraft) -> Result<FfiMedication, PillboxError> {
        let medication = MedicationDraft::try_from(draft)?.into_medication()?;
        let service = self.service.lock()?;
        service.add_medication(&medication, &chrono::Local::now())?;
        Ok(medication.into())
    }

    /// Save an edited medication and replace its reminders.
    pub fn update_medication(&self, medication: FfiMedication) -> Result<(), PillboxError> {
        let medication = Medication::try_from(medication)?;
        let service = self.service.lock()?;
        service.update_medication(&medication, &chrono::Local::now())?;
        Ok(())
    }

    /// Delete a medication and its reminders.
    pub fn delete_medication(&self, id: String) -> Result<bool, PillboxError> {
        let service = self.service.lock()?;
        Ok(service.delete_medication(&id)?)
    }

    /// Reset a medication's supply to a full pack.
    pub fn record_refill(&self, id: String) -> Result<FfiMedication, PillboxError> {
        let service = self.service.lock()?;
        Ok(service.record_refill(&id, Utc::now())?.into())
    }

    // =========================================================================
    // Dose Operations
    // =========================================================================

    /// Log a dose as taken or skipped.
    pub fn record_dose(
        &self,
        medication_id: String,
        taken: bool,
    ) -> Result<FfiDosageHistory, PillboxError> {
        let service = self.service.lock()?;
        Ok(service.record_dose(&medication_id, taken, Utc::now())?.into())
    }

    /// Full dose log.
    pub fn dose_history(&self) -> Result<Vec<FfiDosageHistory>, PillboxError> {
        let service = self.service.lock()?;
        Ok(service.dose_history().into_iter().map(Into::into).collect())
    }

    /// Home-screen state for the current local day.
    pub fn todays_overview(&self) -> Result<FfiDailyOverview, PillboxError> {
        let service = self.service.lock()?;
        Ok(service.daily_overview(&chrono::Local::now()).into())
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Delete all medications and dose history.
    pub fn clear_all_data(&self) -> Result<(), PillboxError> {
        let service = self.service.lock()?;
        Ok(service.clear_all_data()?)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, PillboxError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| PillboxError::InvalidInput(format!("{}: {}", value, e)))
}

fn parse_times(times: &[String]) -> Result<Vec<DoseTime>, PillboxError> {
    times
        .iter()
        .map(|t| t.parse::<DoseTime>().map_err(Into::into))
        .collect()
}

/// FFI-safe medication.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedication {
    pub id: String,
    pub name: String,
    pub dosage: String,
    pub times: Vec<String>,
    pub start_date: String,
    /// Days, or -1 for ongoing
    pub duration_days: i64,
    pub color: String,
    pub reminder_enabled: bool,
    pub current_supply: u32,
    pub total_supply: u32,
    pub refill_at: u32,
    pub refill_reminder: bool,
    pub last_refill_date: Option<String>,
}

impl From<Medication> for FfiMedication {
    fn from(med: Medication) -> Self {
        Self {
            id: med.id,
            name: med.name,
            dosage: med.dosage,
            times: med.times.iter().map(ToString::to_string).collect(),
            start_date: med.start_date.to_rfc3339(),
            duration_days: med.duration.into(),
            color: med.color,
            reminder_enabled: med.reminder_enabled,
            current_supply: med.current_supply,
            total_supply: med.total_supply,
            refill_at: med.refill_at,
            refill_reminder: med.refill_reminder,
            last_refill_date: med.last_refill_date.map(|d| d.to_rfc3339()),
        }
    }
}

impl TryFrom<FfiMedication> for Medication {
    type Error = PillboxError;

    fn try_from(med: FfiMedication) -> Result<Self, Self::Error> {
        Ok(Medication {
            times: parse_times(&med.times)?,
            start_date: parse_timestamp(&med.start_date)?,
            duration: TreatmentDuration::from_days(med.duration_days)?,
            last_refill_date: med
                .last_refill_date
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
            id: med.id,
            name: med.name,
            dosage: med.dosage,
            color: med.color,
            reminder_enabled: med.reminder_enabled,
            current_supply: med.current_supply,
            total_supply: med.total_supply,
            refill_at: med.refill_at,
            refill_reminder: med.refill_reminder,
        })
    }
}

/// FFI-safe frequency preset.
#[derive(Debug, Clone, Copy, uniffi::Enum)]
pub enum FfiFrequency {
    OnceDaily,
    TwiceDaily,
    ThreeTimesDaily,
    FourTimesDaily,
    AsNeeded,
}

impl From<FfiFrequency> for Frequency {
    fn from(frequency: FfiFrequency) -> Self {
        match frequency {
            FfiFrequency::OnceDaily => Frequency::OnceDaily,
            FfiFrequency::TwiceDaily => Frequency::TwiceDaily,
            FfiFrequency::ThreeTimesDaily => Frequency::ThreeTimesDaily,
            FfiFrequency::FourTimesDaily => Frequency::FourTimesDaily,
            FfiFrequency::AsNeeded => Frequency::AsNeeded,
        }
    }
}

impl From<Frequency> for FfiFrequency {
    fn from(frequency: Frequency) -> Self {
        match frequency {
            Frequency::OnceDaily => FfiFrequency::OnceDaily,
            Frequency::TwiceDaily => FfiFrequency::TwiceDaily,
            Frequency::ThreeTimesDaily => FfiFrequency::ThreeTimesDaily,
            Frequency::FourTimesDaily => FfiFrequency::FourTimesDaily,
            Frequency::AsNeeded => FfiFrequency::AsNeeded,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiFrequencyPreset {
    pub frequency: FfiFrequency,
    pub label: String,
    pub times: Vec<String>,
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDurationPreset {
    pub label: String,
    /// Days, or -1 for ongoing
    pub duration_days: i64,
}

/// FFI-safe add-medication form.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicationDraft {
    pub name: String,
    pub dosage: String,
    pub frequency: FfiFrequency,
    /// Overrides the frequency's preset times when set
    pub times: Option<Vec<String>>,
    pub start_date: String,
    /// Days, or -1 for ongoing
    pub duration_days: i64,
    pub reminder_enabled: bool,
    pub refill_reminder: bool,
    pub current_supply: Option<u32>,
    pub total_supply: Option<u32>,
    pub refill_at: Option<u32>,
    pub color: Option<String>,
}

impl TryFrom<FfiMedicationDraft> for MedicationDraft {
    type Error = PillboxError;

    fn try_from(form: FfiMedicationDraft) -> Result<Self, Self::Error> {
        let mut draft = MedicationDraft::new(parse_timestamp(&form.start_date)?);
        draft.set_frequency(form.frequency.into());
        if let Some(times) = &form.times {
            draft.times = parse_times(times)?;
        }
        draft.name = form.name;
        draft.dosage = form.dosage;
        draft.duration = TreatmentDuration::from_days(form.duration_days)?;
        draft.reminder_enabled = form.reminder_enabled;
        draft.refill_reminder = form.refill_reminder;
        draft.current_supply = form.current_supply;
        draft.total_supply = form.total_supply;
        draft.refill_at = form.refill_at;
        draft.color = form.color;
        Ok(draft)
    }
}

/// FFI-safe dose log entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDosageHistory {
    pub id: String,
    pub medication_id: String,
    pub timestamp: String,
    pub taken: bool,
}

impl From<DosageHistory> for FfiDosageHistory {
    fn from(entry: DosageHistory) -> Self {
        Self {
            id: entry.id,
            medication_id: entry.medication_id,
            timestamp: entry.timestamp.to_rfc3339(),
            taken: entry.taken,
        }
    }
}

/// FFI-safe dose status.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDoseStatus {
    pub medication: FfiMedication,
    pub taken: bool,
}

/// FFI-safe home-screen state.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDailyOverview {
    pub medications: Vec<FfiMedication>,
    pub statuses: Vec<FfiDoseStatus>,
    pub expected_total: u32,
    pub completed: u32,
    pub progress_percent: f64,
    pub needs_attention: Vec<FfiMedication>,
}

impl From<DailyOverview> for FfiDailyOverview {
    fn from(overview: DailyOverview) -> Self {
        Self {
            medications: overview.medications.into_iter().map(Into::into).collect(),
            statuses: overview
                .statuses
                .into_iter()
                .map(|s| FfiDoseStatus {
                    medication: s.medication.into(),
                    taken: s.taken,
                })
                .collect(),
            expected_total: overview.progress.expected_total as u32,
            completed: overview.progress.completed as u32,
            progress_percent: overview.progress.progress_percent,
            needs_attention: overview.needs_attention.into_iter().map(Into::into).collect(),
        }
    }
}

/// FFI-safe notification request.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNotificationRequest {
    pub title: String,
    pub body: String,
    /// Payload to attach verbatim, e.g. `{"medicationId":"..."}`
    pub data_json: String,
    pub medication_id: String,
    pub is_refill: bool,
    /// Daily trigger hour; `None` means present immediately
    pub hour: Option<u32>,
    pub minute: Option<u32>,
    pub first_fire: Option<String>,
}

impl TryFrom<NotificationRequest> for FfiNotificationRequest {
    type Error = NotifyError;

    fn try_from(request: NotificationRequest) -> Result<Self, Self::Error> {
        let (hour, minute, first_fire) = match request.trigger {
            NotificationTrigger::Immediate => (None, None, None),
            NotificationTrigger::Daily {
                hour,
                minute,
                first_fire,
            } => (Some(hour), Some(minute), Some(first_fire.to_rfc3339())),
        };

        Ok(Self {
            data_json: request.data.to_json()?,
            is_refill: request.data.kind == Some(NotificationKind::Refill),
            medication_id: request.data.medication_id,
            title: request.title,
            body: request.body,
            hour,
            minute,
            first_fire,
        })
    }
}

/// FFI-safe pending notification.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiScheduledNotification {
    pub identifier: String,
    /// Raw payload as stored by the platform
    pub data_json: Option<String>,
}

/// FFI-safe permission status.
#[derive(Debug, Clone, Copy, uniffi::Enum)]
pub enum FfiPermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

impl From<FfiPermissionStatus> for PermissionStatus {
    fn from(status: FfiPermissionStatus) -> Self {
        match status {
            FfiPermissionStatus::Granted => PermissionStatus::Granted,
            FfiPermissionStatus::Denied => PermissionStatus::Denied,
            FfiPermissionStatus::Undetermined => PermissionStatus::Undetermined,
        }
    }
}

/// FFI-safe Android notification channel.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNotificationChannel {
    pub id: String,
    pub name: String,
    /// "default", "high" or "max"
    pub importance: String,
    pub vibration_pattern: Vec<u64>,
    pub light_color: String,
}

impl From<NotificationChannel> for FfiNotificationChannel {
    fn from(channel: NotificationChannel) -> Self {
        let importance = match channel.importance {
            ChannelImportance::Default => "default",
            ChannelImportance::High => "high",
            ChannelImportance::Max => "max",
        };
        Self {
            id: channel.id,
            name: channel.name,
            importance: importance.to_string(),
            vibration_pattern: channel.vibration_pattern,
            light_color: channel.light_color,
        }
    }
}

/// FFI-safe foreground presentation settings.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPresentation {
    pub show_alert: bool,
    pub play_sound: bool,
    pub set_badge: bool,
    pub show_banner: bool,
    pub show_list: bool,
}

impl From<NotificationPresentation> for FfiPresentation {
    fn from(p: NotificationPresentation) -> Self {
        Self {
            show_alert: p.show_alert,
            play_sound: p.play_sound,
            set_badge: p.set_badge,
            show_banner: p.show_banner,
            show_list: p.show_list,
        }
    }
}
