//! Booking use-case service.
//!
//! # Responsibility
//! - Validate-then-write appointment create/update as one unit of work.
//! - Generate bookable start times and per-day vacancy flags for the
//!   creation form and the calendar.
//! - Serve the denormalized agenda views.
//!
//! # Invariants
//! - Updates merge the stored record with the patch before validating.
//! - An empty patch only checks that the appointment exists; nothing is
//!   re-validated or written.
//! - Days before "today" never report vacancy; today's elapsed minutes are
//!   never counted as free.
//! - Read paths take a fresh snapshot from the store on every call.

use crate::booking::{
    has_vacancy, list_for_day, occupied_intervals, sweep_slots, validate_candidate, BookingError,
    BookingResult, Candidate, ReferenceKind,
};
use crate::clock::{Clock, SystemClock};
use crate::model::appointment::{
    Appointment, AppointmentId, AppointmentPatch, AppointmentStatus, AppointmentWithDetails,
    NewAppointment,
};
use crate::model::catalog::ServiceId;
use crate::model::operator::{OperatorProfile, ScheduleEnvelope};
use crate::model::time::{
    format_minutes, format_start_at, minute_of_day, parse_day_key, MinuteRange, MINUTES_PER_DAY,
};
use crate::repo::{AgendaStore, RepoError};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Slot query; `step_minutes: None` falls back to the configured default
/// step, then to the duration itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotQuery {
    pub day_key: String,
    pub duration_minutes: u32,
    pub step_minutes: Option<u32>,
    /// Appointment being edited; its own interval does not block slots.
    pub exclude_appointment_id: Option<AppointmentId>,
}

impl SlotQuery {
    pub fn new(day_key: impl Into<String>, duration_minutes: u32) -> Self {
        Self {
            day_key: day_key.into(),
            duration_minutes,
            step_minutes: None,
            exclude_appointment_id: None,
        }
    }
}

/// Booking facade over an agenda store and a wall clock.
pub struct BookingService<S: AgendaStore, C: Clock = SystemClock> {
    store: S,
    clock: C,
    default_step: Option<u32>,
}

impl<S: AgendaStore> BookingService<S, SystemClock> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: AgendaStore, C: Clock> BookingService<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            default_step: None,
        }
    }

    /// Sets the step used when a slot query leaves it open.
    pub fn with_default_step(mut self, step_minutes: Option<u32>) -> Self {
        self.default_step = step_minutes;
        self
    }

    /// Validates a new appointment and persists it in the same transaction.
    pub fn validate_and_create(&self, request: &NewAppointment) -> BookingResult<AppointmentId> {
        let status = request.status.unwrap_or(AppointmentStatus::Confirmed);
        let result = self.store.atomically(|store| -> BookingResult<(AppointmentId, Option<MinuteRange>)> {
            let accepted = validate_candidate(
                store,
                &Candidate {
                    client_id: request.client_id,
                    service_id: request.service_id,
                    start_at: request.start_at.as_str(),
                    status,
                    exclude: None,
                    kept_client: None,
                    kept_service: None,
                    kept_start: None,
                },
            )?;

            let appointment = Appointment {
                id: Uuid::new_v4(),
                client_id: request.client_id,
                service_id: request.service_id,
                start_at: accepted.start_at,
                status,
                notes: normalize_notes(request.notes.as_deref()),
            };
            let id = store.create_appointment(&appointment)?;
            Ok((id, accepted.requested))
        });

        match &result {
            Ok((id, requested)) => info!(
                "event=appointment_create module=booking status=ok appointment_id={id} service_id={} requested={}",
                request.service_id,
                describe_span(*requested)
            ),
            Err(err) => log_rejection("appointment_create", None, err),
        }
        result.map(|(id, _)| id)
    }

    /// Merges `patch` into the stored record, re-validates the merged record
    /// and writes it back.
    pub fn validate_and_update(
        &self,
        id: AppointmentId,
        patch: &AppointmentPatch,
    ) -> BookingResult<()> {
        if patch.is_empty() {
            return self.confirm_unchanged(id);
        }

        let result = self.store.atomically(|store| -> BookingResult<Option<MinuteRange>> {
            let current = store
                .get_appointment(id)?
                .ok_or(BookingError::ReferenceNotFound {
                    kind: ReferenceKind::Appointment,
                    id,
                })?;

            let client_id = patch.client_id.unwrap_or(current.client_id);
            let service_id = patch.service_id.unwrap_or(current.service_id);
            let status = patch.status.unwrap_or(current.status);
            let start_at = patch
                .start_at
                .clone()
                .unwrap_or_else(|| format_start_at(current.start_at));

            let accepted = validate_candidate(
                store,
                &Candidate {
                    client_id,
                    service_id,
                    start_at: start_at.as_str(),
                    status,
                    exclude: Some(id),
                    kept_client: Some(current.client_id),
                    kept_service: Some(current.service_id),
                    kept_start: Some(current.start_at),
                },
            )?;

            let notes = match &patch.notes {
                Some(notes) => normalize_notes(notes.as_deref()),
                None => current.notes.clone(),
            };
            let merged = Appointment {
                id,
                client_id,
                service_id,
                start_at: accepted.start_at,
                status,
                notes,
            };
            store.update_appointment(&merged)?;
            Ok(accepted.requested)
        });

        match &result {
            Ok(requested) => info!(
                "event=appointment_update module=booking status=ok appointment_id={id} requested={}",
                describe_span(*requested)
            ),
            Err(err) => log_rejection("appointment_update", Some(id), err),
        }
        result.map(|_| ())
    }

    fn confirm_unchanged(&self, id: AppointmentId) -> BookingResult<()> {
        let result = match self.store.get_appointment(id) {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(BookingError::ReferenceNotFound {
                kind: ReferenceKind::Appointment,
                id,
            }),
            Err(err) => Err(err.into()),
        };
        match &result {
            Ok(()) => debug!(
                "event=appointment_update module=booking status=ok appointment_id={id} changed=false"
            ),
            Err(err) => log_rejection("appointment_update", Some(id), err),
        }
        result
    }

    pub fn get_appointment(&self, id: AppointmentId) -> BookingResult<Option<Appointment>> {
        Ok(self.store.get_appointment(id)?)
    }

    /// Working window and break for `day_key`.
    pub fn get_envelope(&self, day_key: &str) -> BookingResult<ScheduleEnvelope> {
        let date = parse_day(day_key)?;
        let profile = self.require_profile()?;
        Ok(profile.schedule.envelope(date))
    }

    /// Bookable start times (`HH:MM`) for `duration_minutes`, stepping by
    /// `step_minutes` from the start of the working window.
    pub fn generate_slots(
        &self,
        day_key: &str,
        duration_minutes: u32,
        step_minutes: u32,
    ) -> BookingResult<Vec<String>> {
        self.generate_slots_with(&SlotQuery {
            step_minutes: Some(step_minutes),
            ..SlotQuery::new(day_key, duration_minutes)
        })
    }

    pub fn generate_slots_with(&self, query: &SlotQuery) -> BookingResult<Vec<String>> {
        let step = query
            .step_minutes
            .or(self.default_step)
            .unwrap_or(query.duration_minutes);
        if query.duration_minutes == 0 {
            return Err(BookingError::InvalidRequest(
                "duration must be positive".to_string(),
            ));
        }
        if step == 0 {
            return Err(BookingError::InvalidRequest("step must be positive".to_string()));
        }

        let date = parse_day(&query.day_key)?;
        let envelope = self.require_profile()?.schedule.envelope(date);
        let booked = occupied_intervals(&self.store, date, query.exclude_appointment_id)?;
        let slots: Vec<String> = sweep_slots(&envelope, &booked, query.duration_minutes, step)
            .into_iter()
            .map(format_minutes)
            .collect();

        debug!(
            "event=slots_generate module=booking status=ok day={} duration={} step={} booked_count={} slot_count={}",
            query.day_key,
            query.duration_minutes,
            step,
            booked.len(),
            slots.len()
        );
        Ok(slots)
    }

    /// Slots for one service, using its duration as both length and step.
    ///
    /// A tombstoned service resolves only when it is the one already booked
    /// on `exclude`.
    pub fn generate_slots_for_service(
        &self,
        day_key: &str,
        service_id: ServiceId,
        exclude: Option<AppointmentId>,
    ) -> BookingResult<Vec<String>> {
        let kept_service = match exclude {
            Some(id) => self
                .store
                .get_appointment(id)?
                .map(|appointment| appointment.service_id),
            None => None,
        };
        let service = self
            .store
            .get_service(service_id, kept_service == Some(service_id))?
            .ok_or(BookingError::ReferenceNotFound {
                kind: ReferenceKind::Service,
                id: service_id,
            })?;

        self.generate_slots_with(&SlotQuery {
            day_key: day_key.to_string(),
            duration_minutes: service.duration_minutes,
            step_minutes: Some(service.duration_minutes),
            exclude_appointment_id: exclude,
        })
    }

    /// Whether some gap on `day_key` fits the shortest active service.
    ///
    /// Missing schedule, empty catalog and past days all report `false`.
    pub fn day_has_vacancy(&self, day_key: &str) -> BookingResult<bool> {
        let date = parse_day(day_key)?;
        let Some(context) = self.vacancy_context()? else {
            return Ok(false);
        };
        self.vacancy_on(date, &context)
    }

    /// `day_has_vacancy` for every day of one calendar month.
    pub fn month_availability(
        &self,
        year: i32,
        month: u32,
    ) -> BookingResult<BTreeMap<NaiveDate, bool>> {
        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
            BookingError::InvalidRequest(format!("invalid month {year}-{month:02}"))
        })?;
        let context = self.vacancy_context()?;

        let mut days = BTreeMap::new();
        for date in first.iter_days().take_while(|date| date.month() == month) {
            let open = match &context {
                Some(context) => self.vacancy_on(date, context)?,
                None => false,
            };
            days.insert(date, open);
        }
        Ok(days)
    }

    /// Every appointment on `day_key` with its client and service, ordered
    /// by start. Cancelled ones are included.
    pub fn list_day_with_details(&self, day_key: &str) -> BookingResult<Vec<AppointmentWithDetails>> {
        let date = parse_day(day_key)?;
        let appointments = list_for_day(&self.store, date)?;
        self.attach_details(appointments)
    }

    /// Same as `list_day_with_details` for the inclusive range `from..=to`.
    pub fn list_range_with_details(
        &self,
        from_day_key: &str,
        to_day_key: &str,
    ) -> BookingResult<Vec<AppointmentWithDetails>> {
        let from = parse_day(from_day_key)?;
        let to = parse_day(to_day_key)?;
        if from > to {
            return Err(BookingError::InvalidRequest(format!(
                "range start {from_day_key} is after range end {to_day_key}"
            )));
        }
        let appointments = self.store.list_appointments_between(from, to)?;
        self.attach_details(appointments)
    }

    fn require_profile(&self) -> BookingResult<OperatorProfile> {
        self.store
            .get_operator_profile()?
            .ok_or(BookingError::NoScheduleConfigured)
    }

    fn vacancy_context(&self) -> BookingResult<Option<VacancyContext>> {
        let Some(profile) = self.store.get_operator_profile()? else {
            return Ok(None);
        };
        let shortest = self
            .store
            .list_services(false)?
            .iter()
            .map(|service| service.duration_minutes)
            .min();
        Ok(shortest.map(|shortest| VacancyContext {
            profile,
            shortest,
            now: self.clock.now(),
        }))
    }

    fn vacancy_on(&self, date: NaiveDate, context: &VacancyContext) -> BookingResult<bool> {
        let today = context.now.date();
        if date < today {
            return Ok(false);
        }
        let not_before = (date == today).then(|| elapsed_minutes_ceil(context.now));
        let envelope = context.profile.schedule.envelope(date);
        let booked = occupied_intervals(&self.store, date, None)?;
        Ok(has_vacancy(&envelope, &booked, context.shortest, not_before))
    }

    fn attach_details(
        &self,
        appointments: Vec<Appointment>,
    ) -> BookingResult<Vec<AppointmentWithDetails>> {
        appointments
            .into_iter()
            .map(|appointment| -> BookingResult<AppointmentWithDetails> {
                let client = self
                    .store
                    .get_client(appointment.client_id, true)?
                    .ok_or_else(|| {
                        RepoError::InvalidData(format!(
                            "appointment {} references missing client {}",
                            appointment.id, appointment.client_id
                        ))
                    })?;
                let service = self
                    .store
                    .get_service(appointment.service_id, true)?
                    .ok_or_else(|| {
                        RepoError::InvalidData(format!(
                            "appointment {} references missing service {}",
                            appointment.id, appointment.service_id
                        ))
                    })?;
                Ok(AppointmentWithDetails::assemble(appointment, client, service))
            })
            .collect()
    }
}

struct VacancyContext {
    profile: OperatorProfile,
    shortest: u32,
    now: NaiveDateTime,
}

fn parse_day(day_key: &str) -> BookingResult<NaiveDate> {
    parse_day_key(day_key).ok_or_else(|| BookingError::InvalidDateTime {
        input: day_key.to_string(),
    })
}

/// First whole minute not yet started at `now`.
fn elapsed_minutes_ceil(now: NaiveDateTime) -> u32 {
    let time = now.time();
    let partial = u32::from(time.second() > 0 || time.nanosecond() > 0);
    (minute_of_day(time) + partial).min(MINUTES_PER_DAY)
}

fn normalize_notes(notes: Option<&str>) -> Option<String> {
    notes
        .map(str::trim)
        .filter(|notes| !notes.is_empty())
        .map(str::to_string)
}

fn log_rejection(event: &str, id: Option<AppointmentId>, err: &BookingError) {
    let id = id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
    match err {
        BookingError::Repo(_) => warn!(
            "event={event} module=booking status=error appointment_id={id} reason={} error={err}",
            err.code()
        ),
        _ if err.is_rule_rejection() => info!(
            "event={event} module=booking status=rejected appointment_id={id} reason={}",
            err.code()
        ),
        _ => debug!(
            "event={event} module=booking status=rejected appointment_id={id} reason={} error={err}",
            err.code()
        ),
    }
}

fn describe_span(requested: Option<MinuteRange>) -> String {
    requested.map_or_else(|| "none".to_string(), |range| range.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(value: &str) -> NaiveDateTime {
        crate::model::time::parse_start_at(value).unwrap()
    }

    #[test]
    fn elapsed_minutes_round_up_partial_minutes() {
        assert_eq!(elapsed_minutes_ceil(at("2025-01-06T10:30")), 630);
        let with_seconds = at("2025-01-06T10:30") + chrono::Duration::seconds(1);
        assert_eq!(elapsed_minutes_ceil(with_seconds), 631);
    }

    #[test]
    fn notes_are_trimmed_and_blank_dropped() {
        assert_eq!(normalize_notes(Some("  fade  ")), Some("fade".to_string()));
        assert_eq!(normalize_notes(Some("   ")), None);
        assert_eq!(normalize_notes(None), None);
    }
}
