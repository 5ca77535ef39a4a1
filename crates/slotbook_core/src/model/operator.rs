//! Operator profile and working-hours envelope.
//!
//! # Responsibility
//! - Hold the single operator's working window and optional break window.
//! - Derive the per-day availability envelope used by every booking rule.
//!
//! # Invariants
//! - `work_start < work_end`.
//! - When present, the break lies inside the working window and is non-empty.
//! - Break start/end are either both present or both absent (one `Option`).

use crate::model::time::{format_minutes, to_minutes, MalformedTimeError, MinuteRange};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validation failures for operator working hours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileValidationError {
    /// Display name is blank after trim.
    BlankName,
    /// A boundary is not a valid `HH:MM`.
    MalformedTime(MalformedTimeError),
    /// `work_start` is not strictly before `work_end`.
    EmptyWorkWindow { work_start: u32, work_end: u32 },
    /// Break is empty or inverted.
    EmptyBreak { break_start: u32, break_end: u32 },
    /// Break extends outside the working window.
    BreakOutsideWorkWindow { work: MinuteRange, break_window: MinuteRange },
    /// Only one of break start/end was supplied.
    IncompleteBreak,
}

impl Display for ProfileValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "operator name must not be blank"),
            Self::MalformedTime(err) => write!(f, "{err}"),
            Self::EmptyWorkWindow {
                work_start,
                work_end,
            } => write!(
                f,
                "work start {} must be before work end {}",
                format_minutes(*work_start),
                format_minutes(*work_end)
            ),
            Self::EmptyBreak {
                break_start,
                break_end,
            } => write!(
                f,
                "break start {} must be before break end {}",
                format_minutes(*break_start),
                format_minutes(*break_end)
            ),
            Self::BreakOutsideWorkWindow { work, break_window } => write!(
                f,
                "break {break_window} must lie inside working hours {work}"
            ),
            Self::IncompleteBreak => {
                write!(f, "break start and break end must be provided together")
            }
        }
    }
}

impl Error for ProfileValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MalformedTime(err) => Some(err),
            _ => None,
        }
    }
}

impl From<MalformedTimeError> for ProfileValidationError {
    fn from(value: MalformedTimeError) -> Self {
        Self::MalformedTime(value)
    }
}

/// The operator's configured day, all in minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorSchedule {
    pub work_start: u32,
    pub work_end: u32,
    pub break_window: Option<MinuteRange>,
}

impl OperatorSchedule {
    /// Builds a schedule from boundary strings and validates it.
    pub fn from_hhmm(
        work_start: &str,
        work_end: &str,
        break_window: Option<(&str, &str)>,
    ) -> Result<Self, ProfileValidationError> {
        let break_window = match break_window {
            Some((start, end)) => Some(MinuteRange::new(to_minutes(start)?, to_minutes(end)?)),
            None => None,
        };
        let schedule = Self {
            work_start: to_minutes(work_start)?,
            work_end: to_minutes(work_end)?,
            break_window,
        };
        schedule.validate()?;
        Ok(schedule)
    }

    pub fn validate(&self) -> Result<(), ProfileValidationError> {
        if self.work_start >= self.work_end {
            return Err(ProfileValidationError::EmptyWorkWindow {
                work_start: self.work_start,
                work_end: self.work_end,
            });
        }
        if let Some(break_window) = self.break_window {
            if break_window.is_empty() {
                return Err(ProfileValidationError::EmptyBreak {
                    break_start: break_window.start,
                    break_end: break_window.end,
                });
            }
            let work = self.work_window();
            if !work.contains(&break_window) {
                return Err(ProfileValidationError::BreakOutsideWorkWindow {
                    work,
                    break_window,
                });
            }
        }
        Ok(())
    }

    pub fn work_window(&self) -> MinuteRange {
        MinuteRange::new(self.work_start, self.work_end)
    }

    /// Returns the envelope for `date`.
    ///
    /// Every day currently shares one envelope; the date parameter keeps the
    /// call shape stable for per-weekday schedules.
    pub fn envelope(&self, _date: NaiveDate) -> ScheduleEnvelope {
        ScheduleEnvelope {
            work: self.work_window(),
            break_window: self.break_window,
        }
    }
}

/// Working window and optional break for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleEnvelope {
    pub work: MinuteRange,
    pub break_window: Option<MinuteRange>,
}

/// Persisted singleton operator profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorProfile {
    pub display_name: String,
    pub schedule: OperatorSchedule,
}

impl OperatorProfile {
    pub fn validate(&self) -> Result<(), ProfileValidationError> {
        if self.display_name.trim().is_empty() {
            return Err(ProfileValidationError::BlankName);
        }
        self.schedule.validate()
    }
}

/// Partial update for the operator profile; `None` keeps the stored value.
///
/// `break_window: Some(None)` clears the break.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperatorProfilePatch {
    pub display_name: Option<String>,
    pub work_start: Option<String>,
    pub work_end: Option<String>,
    pub break_window: Option<Option<(String, String)>>,
}

impl OperatorProfilePatch {
    /// Applies the patch on top of `current` and validates the merged record.
    pub fn merge_into(
        &self,
        current: &OperatorProfile,
    ) -> Result<OperatorProfile, ProfileValidationError> {
        let mut schedule = current.schedule;
        if let Some(value) = &self.work_start {
            schedule.work_start = to_minutes(value)?;
        }
        if let Some(value) = &self.work_end {
            schedule.work_end = to_minutes(value)?;
        }
        if let Some(break_window) = &self.break_window {
            schedule.break_window = match break_window {
                Some((start, end)) => Some(MinuteRange::new(to_minutes(start)?, to_minutes(end)?)),
                None => None,
            };
        }

        let merged = OperatorProfile {
            display_name: self
                .display_name
                .as_deref()
                .map(str::trim)
                .map(str::to_string)
                .unwrap_or_else(|| current.display_name.clone()),
            schedule,
        };
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_hhmm_builds_valid_schedule() {
        let schedule = OperatorSchedule::from_hhmm("09:00", "18:00", Some(("12:00", "13:00")))
            .expect("valid schedule");
        assert_eq!(schedule.work_start, 540);
        assert_eq!(schedule.work_end, 1080);
        assert_eq!(schedule.break_window, Some(MinuteRange::new(720, 780)));
    }

    #[test]
    fn inverted_work_window_is_rejected() {
        let err = OperatorSchedule::from_hhmm("18:00", "09:00", None).unwrap_err();
        assert!(matches!(err, ProfileValidationError::EmptyWorkWindow { .. }));
    }

    #[test]
    fn break_must_be_inside_work_window() {
        let err = OperatorSchedule::from_hhmm("09:00", "18:00", Some(("08:30", "09:30")))
            .unwrap_err();
        assert!(matches!(
            err,
            ProfileValidationError::BreakOutsideWorkWindow { .. }
        ));

        let err = OperatorSchedule::from_hhmm("09:00", "18:00", Some(("13:00", "12:00")))
            .unwrap_err();
        assert!(matches!(err, ProfileValidationError::EmptyBreak { .. }));
    }

    #[test]
    fn break_touching_work_boundaries_is_allowed() {
        OperatorSchedule::from_hhmm("09:00", "18:00", Some(("09:00", "10:00"))).unwrap();
        OperatorSchedule::from_hhmm("09:00", "18:00", Some(("17:00", "18:00"))).unwrap();
    }

    #[test]
    fn patch_merges_and_revalidates() {
        let current = OperatorProfile {
            display_name: "Ana".to_string(),
            schedule: OperatorSchedule::from_hhmm("09:00", "18:00", None).unwrap(),
        };

        let patch = OperatorProfilePatch {
            break_window: Some(Some(("12:00".to_string(), "13:00".to_string()))),
            ..OperatorProfilePatch::default()
        };
        let merged = patch.merge_into(&current).unwrap();
        assert_eq!(merged.display_name, "Ana");
        assert_eq!(merged.schedule.break_window, Some(MinuteRange::new(720, 780)));

        let shrink = OperatorProfilePatch {
            work_end: Some("12:30".to_string()),
            ..OperatorProfilePatch::default()
        };
        let err = shrink.merge_into(&merged).unwrap_err();
        assert!(matches!(
            err,
            ProfileValidationError::BreakOutsideWorkWindow { .. }
        ));
    }
}
