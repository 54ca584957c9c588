//! Schedule primitives: time-of-day dose slots and treatment durations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Milliseconds in one (fixed-length) day.
pub const MS_PER_DAY: i64 = 86_400_000;

/// Sentinel stored for an ongoing treatment.
pub const ONGOING_SENTINEL: i64 = -1;

/// Errors raised while parsing schedule fields.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    #[error("Invalid dose time: {0:?} (expected HH:MM)")]
    InvalidTime(String),

    #[error("Invalid duration: {0:?}")]
    InvalidDuration(String),
}

/// A daily dose slot, stored as `"HH:MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DoseTime {
    hour: u32,
    minute: u32,
}

impl DoseTime {
    /// Create a dose time, rejecting out-of-range values.
    pub fn new(hour: u32, minute: u32) -> Result<Self, ScheduleError> {
        if hour > 23 || minute > 59 {
            return Err(ScheduleError::InvalidTime(format!("{}:{}", hour, minute)));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }
}

impl FromStr for DoseTime {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ScheduleError::InvalidTime(s.to_string());
        let (hours, minutes) = s.trim().split_once(':').ok_or_else(invalid)?;

        // Single-digit hours ("9:00") are accepted, minutes must be two digits.
        if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 {
            return Err(invalid());
        }
        let hour = hours.parse::<u32>().map_err(|_| invalid())?;
        let minute = minutes.parse::<u32>().map_err(|_| invalid())?;

        Self::new(hour, minute).map_err(|_| invalid())
    }
}

impl fmt::Display for DoseTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl TryFrom<String> for DoseTime {
    type Error = ScheduleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DoseTime> for String {
    fn from(time: DoseTime) -> Self {
        time.to_string()
    }
}

/// How long a course of treatment runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDuration", into = "i64")]
pub enum TreatmentDuration {
    /// A fixed number of days from the start date
    Days(u32),
    /// No end date (stored as -1)
    Ongoing,
}

impl TreatmentDuration {
    /// Build from the stored integer form.
    pub fn from_days(days: i64) -> Result<Self, ScheduleError> {
        match days {
            ONGOING_SENTINEL => Ok(Self::Ongoing),
            d if d > 0 && d <= u32::MAX as i64 => Ok(Self::Days(d as u32)),
            d => Err(ScheduleError::InvalidDuration(d.to_string())),
        }
    }

    pub fn is_ongoing(&self) -> bool {
        matches!(self, Self::Ongoing)
    }

    /// Window length in milliseconds, `None` when ongoing.
    pub fn window_ms(&self) -> Option<i64> {
        match self {
            Self::Days(days) => Some(*days as i64 * MS_PER_DAY),
            Self::Ongoing => None,
        }
    }
}

impl From<TreatmentDuration> for i64 {
    fn from(duration: TreatmentDuration) -> Self {
        match duration {
            TreatmentDuration::Days(days) => days as i64,
            TreatmentDuration::Ongoing => ONGOING_SENTINEL,
        }
    }
}

impl FromStr for TreatmentDuration {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        if normalized == "ongoing" {
            return Ok(Self::Ongoing);
        }

        let number = normalized
            .strip_suffix("days")
            .or_else(|| normalized.strip_suffix("day"))
            .unwrap_or(&normalized)
            .trim();

        number
            .parse::<i64>()
            .map_err(|_| ScheduleError::InvalidDuration(s.to_string()))
            .and_then(Self::from_days)
    }
}

/// Stored duration: an integer, or a label written by older app versions.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Number(i64),
    Text(String),
}

impl TryFrom<RawDuration> for TreatmentDuration {
    type Error = ScheduleError;

    fn try_from(raw: RawDuration) -> Result<Self, Self::Error> {
        match raw {
            RawDuration::Number(days) => Self::from_days(days),
            RawDuration::Text(text) => text.parse(),
        }
    }
}
