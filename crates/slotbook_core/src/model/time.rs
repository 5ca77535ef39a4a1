//! Wall-clock time arithmetic shared by every scheduling rule.
//!
//! # Responsibility
//! - Convert `HH:MM` strings to minutes-since-midnight and back.
//! - Parse canonical daykeys (`YYYY-MM-DD`) and appointment start stamps.
//! - Provide the half-open overlap test used by all conflict checks.
//!
//! # Invariants
//! - Intervals are half-open `[start, end)`; touching intervals never overlap.
//! - Times are operator-local wall clock. Nothing here converts timezones.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static HHMM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{2}):(\d{2})$").expect("valid HH:MM regex"));

/// Minutes in one calendar day.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

const DAY_KEY_FORMAT: &str = "%Y-%m-%d";
const START_AT_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Raised when a `HH:MM` string does not describe a valid time of day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedTimeError {
    pub input: String,
}

impl Display for MalformedTimeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed time `{}`; expected HH:MM", self.input)
    }
}

impl Error for MalformedTimeError {}

/// Parses `"HH:MM"` into minutes since midnight.
///
/// Hours must be `00..=23` and minutes `00..=59`.
pub fn to_minutes(hhmm: &str) -> Result<u32, MalformedTimeError> {
    let malformed = || MalformedTimeError {
        input: hhmm.to_string(),
    };
    let caps = HHMM_RE.captures(hhmm).ok_or_else(malformed)?;
    let hour: u32 = caps[1].parse().map_err(|_| malformed())?;
    let minute: u32 = caps[2].parse().map_err(|_| malformed())?;
    if hour > 23 || minute > 59 {
        return Err(malformed());
    }
    Ok(hour * 60 + minute)
}

/// Formats minutes since midnight as zero-padded `"HH:MM"`.
pub fn format_minutes(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Half-open overlap test: `startA < endB && startB < endA`.
pub fn overlaps(start_a: u32, end_a: u32, start_b: u32, end_b: u32) -> bool {
    start_a < end_b && start_b < end_a
}

/// Minute-of-day of a wall-clock time, ignoring seconds.
pub fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Half-open `[start, end)` interval in minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MinuteRange {
    pub start: u32,
    pub end: u32,
}

impl MinuteRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Range starting at `start` and lasting `duration` minutes.
    ///
    /// The end saturates at `u32::MAX`; callers bound `duration` first.
    pub fn starting_at(start: u32, duration: u32) -> Self {
        Self {
            start,
            end: start.saturating_add(duration),
        }
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn overlaps(&self, other: &MinuteRange) -> bool {
        overlaps(self.start, self.end, other.start, other.end)
    }

    /// True when `other` lies entirely inside this range.
    pub fn contains(&self, other: &MinuteRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl Display for MinuteRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}",
            format_minutes(self.start),
            format_minutes(self.end)
        )
    }
}

/// Parses a canonical `"YYYY-MM-DD"` daykey.
pub fn parse_day_key(value: &str) -> Option<NaiveDate> {
    if value.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(value, DAY_KEY_FORMAT).ok()
}

/// Formats a date as canonical daykey.
pub fn day_key(date: NaiveDate) -> String {
    date.format(DAY_KEY_FORMAT).to_string()
}

/// Parses an appointment start stamp (`YYYY-MM-DDTHH:MM[:00]`).
///
/// Seconds are accepted only when zero: bookings have minute precision.
pub fn parse_start_at(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    START_AT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .filter(|stamp| stamp.second() == 0 && stamp.nanosecond() == 0)
}

/// Formats a start stamp as `YYYY-MM-DDTHH:MM`.
pub fn format_start_at(value: NaiveDateTime) -> String {
    value.format(START_AT_FORMATS[0]).to_string()
}
