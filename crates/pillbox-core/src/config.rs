//! Engine configuration.
//!
//! Every field has a default, so an empty TOML document is a valid config:
//!
//! ```toml
//! reminder_policy = "all_times"
//! expected_doses = { per_medication = 2 }
//!
//! [presentation]
//! show_list = false
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::notifications::NotificationPresentation;

/// Doses per active medication assumed by the legacy progress screen.
pub const DEFAULT_DOSES_PER_MEDICATION: u32 = 2;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Which dose times get a daily reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderPolicy {
    /// One repeating reminder per configured dose time
    #[default]
    AllTimes,
    /// Only the first dose time, matching earlier app releases
    FirstTimeOnly,
}

/// How many doses a day each active medication is expected to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedDoses {
    /// Same count for every medication
    PerMedication(u32),
    /// Length of each medication's `times` list
    ScheduledTimes,
}

impl Default for ExpectedDoses {
    fn default() -> Self {
        ExpectedDoses::PerMedication(DEFAULT_DOSES_PER_MEDICATION)
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PillboxConfig {
    pub reminder_policy: ReminderPolicy,
    pub expected_doses: ExpectedDoses,
    pub presentation: NotificationPresentation,
}

impl PillboxConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }
}
