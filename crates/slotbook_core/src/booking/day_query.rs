//! Day snapshot queries against the store.

use super::conflict::BookedInterval;
use super::error::BookingResult;
use crate::model::appointment::{Appointment, AppointmentId};
use crate::model::catalog::ServiceId;
use crate::model::time::MinuteRange;
use crate::repo::{AppointmentRepository, CatalogRepository, RepoError};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Fresh snapshot of every appointment on `date`, cancelled ones included.
pub(crate) fn list_for_day<S: AppointmentRepository>(
    store: &S,
    date: NaiveDate,
) -> BookingResult<Vec<Appointment>> {
    Ok(store.list_appointments_on_date(date)?)
}

/// Resolves the time taken by each non-cancelled appointment on `date`.
///
/// Durations are read from the service catalog (tombstoned services
/// included). `exclude` drops one appointment, e.g. the one being edited.
pub(crate) fn occupied_intervals<S>(
    store: &S,
    date: NaiveDate,
    exclude: Option<AppointmentId>,
) -> BookingResult<Vec<BookedInterval>>
where
    S: AppointmentRepository + CatalogRepository,
{
    let appointments = list_for_day(store, date)?;
    let mut durations: HashMap<ServiceId, u32> = HashMap::new();
    let mut booked = Vec::with_capacity(appointments.len());

    for appointment in appointments
        .iter()
        .filter(|appointment| appointment.occupies_time())
        .filter(|appointment| Some(appointment.id) != exclude)
    {
        let duration = match durations.get(&appointment.service_id) {
            Some(duration) => *duration,
            None => {
                let service = store
                    .get_service(appointment.service_id, true)?
                    .ok_or_else(|| {
                        RepoError::InvalidData(format!(
                            "appointment {} references missing service {}",
                            appointment.id, appointment.service_id
                        ))
                    })?;
                durations.insert(service.id, service.duration_minutes);
                service.duration_minutes
            }
        };

        booked.push(BookedInterval {
            appointment_id: appointment.id,
            range: MinuteRange::starting_at(appointment.start_minute(), duration),
        });
    }

    Ok(booked)
}
