//! Boundary to the device notification subsystem.
//!
//! The platform scheduler is opaque: it can add a notification, cancel one by
//! identifier, and list what is pending. Every notification carries a
//! [`NotificationData`] payload (`{"medicationId": ..., "type"?: "refill"}`),
//! which is the only way to find the reminders belonging to a medication.

mod handler;
mod memory;
mod registration;
mod reminders;

pub use handler::*;
pub use memory::*;
pub use registration::*;
pub use reminders::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Notification subsystem errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NotifyError {
    #[error("Notification permission not granted")]
    PermissionDenied,

    #[error("Platform scheduler error: {0}")]
    Platform(String),

    #[error("Payload error: {0}")]
    Payload(String),
}

impl From<serde_json::Error> for NotifyError {
    fn from(e: serde_json::Error) -> Self {
        NotifyError::Payload(e.to_string())
    }
}

pub type NotifyResult<T> = Result<T, NotifyError>;

/// Kind tag carried in the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Refill,
}

/// Correlation payload attached to every notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    pub medication_id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<NotificationKind>,
}

impl NotificationData {
    pub fn dose(medication_id: &str) -> Self {
        Self {
            medication_id: medication_id.to_string(),
            kind: None,
        }
    }

    pub fn refill(medication_id: &str) -> Self {
        Self {
            medication_id: medication_id.to_string(),
            kind: Some(NotificationKind::Refill),
        }
    }

    pub fn to_json(&self) -> NotifyResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> NotifyResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// When a notification fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationTrigger {
    /// Present right away, nothing stays pending
    Immediate,
    /// Repeat every day at hour:minute (device local time)
    Daily {
        hour: u32,
        minute: u32,
        /// First occurrence at or after scheduling time
        first_fire: DateTime<Utc>,
    },
}

/// A notification to hand to the platform scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    pub data: NotificationData,
    pub trigger: NotificationTrigger,
}

/// A notification the platform reports as pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledNotification {
    pub identifier: String,
    /// `None` when the payload is missing or was not written by us
    pub data: Option<NotificationData>,
}

impl ScheduledNotification {
    pub fn medication_id(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.medication_id.as_str())
    }
}

/// Opaque device notification scheduler.
pub trait NotificationScheduler {
    /// Register a notification, returning its platform identifier.
    fn schedule(&self, request: NotificationRequest) -> NotifyResult<String>;

    /// Cancel a pending notification. Unknown identifiers are not an error.
    fn cancel(&self, identifier: &str) -> NotifyResult<()>;

    /// List every pending scheduled notification.
    fn pending(&self) -> NotifyResult<Vec<ScheduledNotification>>;
}
