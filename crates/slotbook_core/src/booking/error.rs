use crate::model::appointment::AppointmentId;
use crate::model::time::{format_minutes, MalformedTimeError, MinuteRange};
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type BookingResult<T> = Result<T, BookingError>;

/// Which referenced record failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Client,
    Service,
    Appointment,
}

impl Display for ReferenceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Client => write!(f, "client"),
            Self::Service => write!(f, "service"),
            Self::Appointment => write!(f, "appointment"),
        }
    }
}

/// Rejections and failures of the booking engine.
#[derive(Debug)]
pub enum BookingError {
    /// Client, service or appointment id does not resolve.
    ReferenceNotFound { kind: ReferenceKind, id: Uuid },
    /// Date or start stamp is unparsable.
    InvalidDateTime { input: String },
    /// No operator profile yet; nothing is bookable.
    NoScheduleConfigured,
    /// Candidate leaves `[work_start, work_end)`.
    OutsideWorkingHours {
        requested: MinuteRange,
        work: MinuteRange,
        boundary: u32,
    },
    /// Candidate intersects the break.
    BreakConflict {
        requested: MinuteRange,
        break_window: MinuteRange,
    },
    /// Candidate intersects another non-cancelled appointment.
    DoubleBooking {
        requested: MinuteRange,
        conflicting_id: AppointmentId,
        conflicting: MinuteRange,
    },
    /// Internal `HH:MM` parse failure on data that should already be valid.
    MalformedTime(MalformedTimeError),
    /// Caller passed a non-positive duration/step or an impossible range.
    InvalidRequest(String),
    /// Persistence failure, propagated unchanged.
    Repo(RepoError),
}

impl BookingError {
    /// Stable machine-readable reason used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ReferenceNotFound { .. } => "reference_not_found",
            Self::InvalidDateTime { .. } => "invalid_date_time",
            Self::NoScheduleConfigured => "no_schedule_configured",
            Self::OutsideWorkingHours { .. } => "outside_working_hours",
            Self::BreakConflict { .. } => "break_conflict",
            Self::DoubleBooking { .. } => "double_booking",
            Self::MalformedTime(_) => "malformed_time",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Repo(_) => "repo_error",
        }
    }

    /// True for domain-rule rejections the user can fix by picking another time.
    pub fn is_rule_rejection(&self) -> bool {
        matches!(
            self,
            Self::OutsideWorkingHours { .. } | Self::BreakConflict { .. } | Self::DoubleBooking { .. }
        )
    }
}

impl Display for BookingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReferenceNotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::InvalidDateTime { input } => write!(
                f,
                "invalid date/time `{input}`; expected YYYY-MM-DD or YYYY-MM-DDTHH:MM"
            ),
            Self::NoScheduleConfigured => write!(
                f,
                "no operator schedule configured; set up the operator profile first"
            ),
            Self::OutsideWorkingHours {
                requested,
                work,
                boundary,
            } => write!(
                f,
                "requested {requested} is outside working hours {work} (boundary {})",
                format_minutes(*boundary)
            ),
            Self::BreakConflict {
                requested,
                break_window,
            } => write!(f, "requested {requested} overlaps the break {break_window}"),
            Self::DoubleBooking {
                requested,
                conflicting_id,
                conflicting,
            } => write!(
                f,
                "requested {requested} overlaps appointment {conflicting_id} at {conflicting}"
            ),
            Self::MalformedTime(err) => write!(f, "{err}"),
            Self::InvalidRequest(message) => write!(f, "invalid request: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BookingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MalformedTime(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for BookingError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<MalformedTimeError> for BookingError {
    fn from(value: MalformedTimeError) -> Self {
        Self::MalformedTime(value)
    }
}
