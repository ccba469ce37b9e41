//! Parsing for the date and time literals exchanged with callers.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ServiceError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a `YYYY-MM-DD` calendar date.
pub fn parse_date(raw: &str) -> Result<NaiveDate, ServiceError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| {
        ServiceError::bad_request(format!("invalid date '{}', expected YYYY-MM-DD", raw.trim()))
    })
}

/// A caller-supplied clock value: either a full offset-qualified instant or a
/// bare time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockValue {
    Instant(DateTime<FixedOffset>),
    TimeOfDay(NaiveTime),
}

impl ClockValue {
    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        let trimmed = raw.trim();
        if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(Self::Instant(instant));
        }

        ["%H:%M:%S", "%H:%M"]
            .iter()
            .find_map(|format| NaiveTime::parse_from_str(trimmed, format).ok())
            .map(Self::TimeOfDay)
            .ok_or_else(|| {
                ServiceError::bad_request(format!(
                    "invalid time '{trimmed}', expected an RFC 3339 timestamp or HH:MM"
                ))
            })
    }

    pub fn time_of_day(self) -> NaiveTime {
        match self {
            Self::Instant(instant) => instant.time(),
            Self::TimeOfDay(time) => time,
        }
    }

    /// Re-expresses an instant in the offset of `reference` when both are
    /// instants; anything else comes back unchanged.
    pub fn aligned_to(self, reference: Self) -> Self {
        match (self, reference) {
            (Self::Instant(instant), Self::Instant(anchor)) => {
                Self::Instant(instant.with_timezone(anchor.offset()))
            }
            (value, _) => value,
        }
    }

    /// `true` when both values are instants on different calendar dates.
    pub fn spans_dates(self, other: Self) -> bool {
        match (self, other) {
            (Self::Instant(a), Self::Instant(b)) => a.date_naive() != b.date_naive(),
            _ => false,
        }
    }

    /// `true` when `self` is strictly earlier than `other`.
    ///
    /// Two instants compare on the timeline; any pairing that involves a bare
    /// time of day compares as times of day.
    pub fn is_before(self, other: Self) -> bool {
        match (self, other) {
            (Self::Instant(a), Self::Instant(b)) => a < b,
            (a, b) => a.time_of_day() < b.time_of_day(),
        }
    }
}

/// Weekday a class schedule recurs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }

    pub fn of(date: NaiveDate) -> Self {
        use chrono::Datelike;

        match date.weekday() {
            Weekday::Mon => Self::Monday,
            Weekday::Tue => Self::Tuesday,
            Weekday::Wed => Self::Wednesday,
            Weekday::Thu => Self::Thursday,
            Weekday::Fri => Self::Friday,
            Weekday::Sat => Self::Saturday,
            Weekday::Sun => Self::Sunday,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DayOfWeek {
    type Err = ServiceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "monday" => Ok(Self::Monday),
            "tuesday" => Ok(Self::Tuesday),
            "wednesday" => Ok(Self::Wednesday),
            "thursday" => Ok(Self::Thursday),
            "friday" => Ok(Self::Friday),
            "saturday" => Ok(Self::Saturday),
            "sunday" => Ok(Self::Sunday),
            other => Err(ServiceError::bad_request(format!(
                "invalid day of week '{other}'"
            ))),
        }
    }
}
