//! Availability validation for create and update.
//!
//! Runs the checks in a fixed order so the first failing rule is the one
//! reported: references, start stamp, schedule, working hours, break, other
//! bookings. The validator reads but never writes.
//!
//! Cancelling a stored appointment in place skips the time rules. Any
//! cancelled record that gets a new start or service is checked in full.

use super::conflict::find_conflict;
use super::day_query::occupied_intervals;
use super::error::{BookingError, BookingResult, ReferenceKind};
use crate::model::appointment::{AppointmentId, AppointmentStatus};
use crate::model::catalog::ServiceId;
use crate::model::client::ClientId;
use crate::model::operator::ScheduleEnvelope;
use crate::model::time::{minute_of_day, parse_start_at, MinuteRange};
use crate::repo::{AppointmentRepository, CatalogRepository, ClientRepository, ProfileRepository};
use chrono::NaiveDateTime;
use log::debug;

/// A create request, or an update already merged with its stored record.
#[derive(Debug, Clone)]
pub(crate) struct Candidate<'a> {
    pub client_id: ClientId,
    pub service_id: ServiceId,
    pub start_at: &'a str,
    pub status: AppointmentStatus,
    /// Appointment being updated; skipped in conflict checks.
    pub exclude: Option<AppointmentId>,
    /// Client id stored on the record being updated. It may be tombstoned.
    pub kept_client: Option<ClientId>,
    /// Service id stored on the record being updated. It may be tombstoned.
    pub kept_service: Option<ServiceId>,
    /// Start stored on the record being updated, compared to the minute.
    pub kept_start: Option<NaiveDateTime>,
}

#[derive(Debug, Clone)]
pub(crate) struct AcceptedBooking {
    pub start_at: NaiveDateTime,
    /// `None` when a stored record is cancelled in place.
    pub requested: Option<MinuteRange>,
}

pub(crate) fn validate_candidate<S>(
    store: &S,
    candidate: &Candidate<'_>,
) -> BookingResult<AcceptedBooking>
where
    S: ProfileRepository + ClientRepository + CatalogRepository + AppointmentRepository,
{
    let client_may_be_deleted = candidate.kept_client == Some(candidate.client_id);
    if store
        .get_client(candidate.client_id, client_may_be_deleted)?
        .is_none()
    {
        return Err(BookingError::ReferenceNotFound {
            kind: ReferenceKind::Client,
            id: candidate.client_id,
        });
    }

    let service_may_be_deleted = candidate.kept_service == Some(candidate.service_id);
    let service = store
        .get_service(candidate.service_id, service_may_be_deleted)?
        .ok_or(BookingError::ReferenceNotFound {
            kind: ReferenceKind::Service,
            id: candidate.service_id,
        })?;

    let start_at =
        parse_start_at(candidate.start_at).ok_or_else(|| BookingError::InvalidDateTime {
            input: candidate.start_at.to_string(),
        })?;

    let cancelled_in_place = candidate.status == AppointmentStatus::Cancelled
        && candidate.kept_start.is_some_and(|kept| same_minute(kept, start_at))
        && candidate.kept_service == Some(candidate.service_id);
    if cancelled_in_place {
        return Ok(AcceptedBooking {
            start_at,
            requested: None,
        });
    }

    let profile = store
        .get_operator_profile()?
        .ok_or(BookingError::NoScheduleConfigured)?;
    let envelope = profile.schedule.envelope(start_at.date());
    let requested =
        MinuteRange::starting_at(minute_of_day(start_at.time()), service.duration_minutes);

    check_working_hours(&envelope, requested)?;
    check_break(&envelope, requested)?;

    let booked = occupied_intervals(store, start_at.date(), candidate.exclude)?;
    if let Some(hit) = find_conflict(requested, &booked, candidate.exclude) {
        return Err(BookingError::DoubleBooking {
            requested,
            conflicting_id: hit.appointment_id,
            conflicting: hit.range,
        });
    }

    debug!(
        "event=booking_validate module=booking status=ok service_id={} requested={requested} booked_count={}",
        service.id,
        booked.len()
    );
    Ok(AcceptedBooking {
        start_at,
        requested: Some(requested),
    })
}

fn same_minute(a: NaiveDateTime, b: NaiveDateTime) -> bool {
    a.date() == b.date() && minute_of_day(a.time()) == minute_of_day(b.time())
}

/// Start must fall in `[work_start, work_end)` and the end must not pass `work_end`.
pub(crate) fn check_working_hours(
    envelope: &ScheduleEnvelope,
    requested: MinuteRange,
) -> BookingResult<()> {
    let work = envelope.work;
    let boundary = if requested.start < work.start {
        Some(work.start)
    } else if requested.start >= work.end || requested.end > work.end {
        Some(work.end)
    } else {
        None
    };

    match boundary {
        Some(boundary) => Err(BookingError::OutsideWorkingHours {
            requested,
            work,
            boundary,
        }),
        None => Ok(()),
    }
}

pub(crate) fn check_break(envelope: &ScheduleEnvelope, requested: MinuteRange) -> BookingResult<()> {
    match envelope.break_window {
        Some(break_window) if break_window.overlaps(&requested) => {
            Err(BookingError::BreakConflict {
                requested,
                break_window,
            })
        }
        _ => Ok(()),
    }
}
