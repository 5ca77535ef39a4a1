//! Fixed-step slot sweep over one day.

use super::conflict::{has_conflict, BookedInterval};
use crate::model::operator::ScheduleEnvelope;
use crate::model::time::MinuteRange;

/// Start minutes `t` in `[work.start, work.end - duration]`, stepping by
/// `step`, whose `[t, t + duration)` avoids the break and every booking.
///
/// `duration` and `step` must be positive. A duration longer than the
/// working window yields no slots.
pub fn sweep_slots(
    envelope: &ScheduleEnvelope,
    booked: &[BookedInterval],
    duration: u32,
    step: u32,
) -> Vec<u32> {
    let work = envelope.work;
    if duration == 0 || step == 0 || duration > work.len() {
        return Vec::new();
    }
    let last_start = work.end - duration;

    (work.start..=last_start)
        .step_by(step as usize)
        .filter(|start| {
            let candidate = MinuteRange::starting_at(*start, duration);
            let hits_break = envelope
                .break_window
                .map_or(false, |break_window| break_window.overlaps(&candidate));
            !hits_break && !has_conflict(candidate, booked, None)
        })
        .collect()
}
