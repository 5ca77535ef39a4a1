//! Conflict detection over one day's booked intervals.

use crate::model::appointment::AppointmentId;
use crate::model::time::MinuteRange;

/// Time taken by one non-cancelled appointment, duration already resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookedInterval {
    pub appointment_id: AppointmentId,
    pub range: MinuteRange,
}

/// Returns the first booked interval that half-open-overlaps `candidate`.
///
/// `exclude` skips the appointment being updated in place. Linear scan; the
/// input does not need to be sorted.
pub fn find_conflict<'a>(
    candidate: MinuteRange,
    booked: &'a [BookedInterval],
    exclude: Option<AppointmentId>,
) -> Option<&'a BookedInterval> {
    booked.iter().find(|interval| {
        Some(interval.appointment_id) != exclude && interval.range.overlaps(&candidate)
    })
}

pub fn has_conflict(
    candidate: MinuteRange,
    booked: &[BookedInterval],
    exclude: Option<AppointmentId>,
) -> bool {
    find_conflict(candidate, booked, exclude).is_some()
}
