//! Process-wide notification presentation settings.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

static HANDLER: OnceLock<NotificationPresentation> = OnceLock::new();

/// How the host presents a notification that arrives in the foreground.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotificationPresentation {
    pub show_alert: bool,
    pub play_sound: bool,
    pub set_badge: bool,
    pub show_banner: bool,
    pub show_list: bool,
}

impl Default for NotificationPresentation {
    fn default() -> Self {
        Self {
            show_alert: true,
            play_sound: true,
            set_badge: true,
            show_banner: true,
            show_list: false,
        }
    }
}

/// Install the handler settings. Only the first call takes effect; later
/// calls return what was installed.
pub fn configure_notification_handler(
    presentation: NotificationPresentation,
) -> &'static NotificationPresentation {
    let installed = HANDLER.get_or_init(|| presentation.clone());
    if *installed != presentation {
        tracing::debug!("Notification handler already configured, keeping existing settings");
    }
    installed
}

/// The installed handler settings, if any.
pub fn notification_handler() -> Option<&'static NotificationPresentation> {
    HANDLER.get()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configure_once() {
        let first = configure_notification_handler(NotificationPresentation::default());
        let second = configure_notification_handler(NotificationPresentation {
            show_list: true,
            ..Default::default()
        });

        assert!(std::ptr::eq(first, second));
        assert!(!second.show_list);
        assert_eq!(notification_handler(), Some(first));
    }
}
