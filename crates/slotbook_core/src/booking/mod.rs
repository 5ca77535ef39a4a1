//! Appointment scheduling and slot-availability engine.
//!
//! # Responsibility
//! - Validate candidate appointments against working hours, the break and
//!   the day's existing bookings.
//! - Enumerate bookable start times for a duration.
//! - Answer whether a day has any gap long enough for the shortest service.
//!
//! # Invariants
//! - Every interval test is half-open; back-to-back bookings are allowed.
//! - Cancelled appointments never occupy time.
//! - Appointment length is always re-derived from the referenced service.

mod conflict;
mod day_query;
mod error;
mod slots;
mod vacancy;
mod validator;

pub use conflict::{find_conflict, has_conflict, BookedInterval};
pub use error::{BookingError, BookingResult, ReferenceKind};
pub use slots::sweep_slots;
pub use vacancy::has_vacancy;

pub(crate) use day_query::{list_for_day, occupied_intervals};
pub(crate) use validator::{validate_candidate, Candidate};
