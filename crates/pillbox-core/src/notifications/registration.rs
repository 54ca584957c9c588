//! Permission and push-token registration.

use serde::{Deserialize, Serialize};

use super::NotifyResult;

/// Permission state reported by the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

/// Host operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceOs {
    Ios,
    Android,
}

/// Android channel importance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelImportance {
    Default,
    High,
    Max,
}

/// Android notification channel settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationChannel {
    pub id: String,
    pub name: String,
    pub importance: ChannelImportance,
    pub vibration_pattern: Vec<u64>,
    pub light_color: String,
}

impl Default for NotificationChannel {
    fn default() -> Self {
        Self {
            id: "default".into(),
            name: "default".into(),
            importance: ChannelImportance::Max,
            vibration_pattern: vec![0, 250, 250, 250],
            light_color: "#1a8e2d".into(),
        }
    }
}

/// Device permission and push-token subsystem.
pub trait NotificationPlatform {
    fn os(&self) -> DeviceOs;

    fn permission_status(&self) -> NotifyResult<PermissionStatus>;

    /// Prompt the user. Returns the resulting status.
    fn request_permission(&self) -> NotifyResult<PermissionStatus>;

    fn push_token(&self) -> NotifyResult<String>;

    fn set_channel(&self, channel: &NotificationChannel) -> NotifyResult<()>;
}

/// Ask for notification permission and fetch the push token.
///
/// Returns `None` when permission is not granted or any platform call fails.
pub fn register_for_notifications(platform: &dyn NotificationPlatform) -> Option<String> {
    let status = match platform.permission_status() {
        Ok(PermissionStatus::Granted) => PermissionStatus::Granted,
        Ok(_) => match platform.request_permission() {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(error = %e, "Permission request failed");
                return None;
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "Could not read notification permission");
            return None;
        }
    };

    if status != PermissionStatus::Granted {
        tracing::info!(?status, "Notification permission not granted");
        return None;
    }

    let token = match platform.push_token() {
        Ok(token) => token,
        Err(e) => {
            tracing::warn!(error = %e, "Error getting push token");
            return None;
        }
    };

    if platform.os() == DeviceOs::Android {
        if let Err(e) = platform.set_channel(&NotificationChannel::default()) {
            tracing::warn!(error = %e, "Error creating notification channel");
            return None;
        }
    }

    Some(token)
}
