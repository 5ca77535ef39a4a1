//! Single-pass gap search used to flag bookable days.

use super::conflict::BookedInterval;
use crate::model::operator::ScheduleEnvelope;
use crate::model::time::MinuteRange;

/// True when some gap of at least `shortest` minutes is left in the
/// working window.
///
/// Occupied time is the break plus every booked interval. The cursor starts
/// at `max(work.start, not_before)`; pass `not_before` for today so past
/// minutes never count as free.
pub fn has_vacancy(
    envelope: &ScheduleEnvelope,
    booked: &[BookedInterval],
    shortest: u32,
    not_before: Option<u32>,
) -> bool {
    let work = envelope.work;
    if shortest == 0 {
        return false;
    }

    let mut occupied: Vec<MinuteRange> = booked.iter().map(|interval| interval.range).collect();
    occupied.extend(envelope.break_window);
    occupied.sort_by_key(|range| range.start);

    let mut cursor = not_before.map_or(work.start, |minute| minute.max(work.start));
    for range in occupied {
        let gap_end = range.start.min(work.end);
        if gap_end.saturating_sub(cursor) >= shortest {
            return true;
        }
        cursor = cursor.max(range.end);
        if cursor >= work.end {
            return false;
        }
    }

    work.end.saturating_sub(cursor) >= shortest
}
