//! Appointment persistence and the per-day query path.
//!
//! # Responsibility
//! - Store appointments keyed by operator-local daykey + start time.
//! - Return fresh per-day snapshots (cancelled rows included) to the
//!   booking engine; filtering is the caller's choice.
//!
//! # Invariants
//! - `day_key` is canonical `YYYY-MM-DD`, `start_time` canonical `HH:MM`.
//! - Appointments are never deleted here.

use super::{parse_uuid, RepoError, RepoResult, SqliteAgendaStore};
use crate::model::appointment::{Appointment, AppointmentId, AppointmentStatus};
use crate::model::catalog::ServiceId;
use crate::model::time::{day_key, format_minutes, parse_day_key, to_minutes};
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

const APPOINTMENT_SELECT_SQL: &str = "SELECT
    uuid,
    client_uuid,
    service_uuid,
    day_key,
    start_time,
    status,
    notes
FROM appointments";

pub trait AppointmentRepository {
    fn create_appointment(&self, appointment: &Appointment) -> RepoResult<AppointmentId>;
    fn update_appointment(&self, appointment: &Appointment) -> RepoResult<()>;
    fn get_appointment(&self, id: AppointmentId) -> RepoResult<Option<Appointment>>;
    /// All appointments starting on `date`, cancelled ones included,
    /// ordered by start time then id.
    fn list_appointments_on_date(&self, date: NaiveDate) -> RepoResult<Vec<Appointment>>;
    /// Appointments with `from <= day <= to`, ordered by day, start, id.
    fn list_appointments_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepoResult<Vec<Appointment>>;
    /// Number of non-cancelled appointments referencing `service_id`.
    fn count_active_appointments_for_service(&self, service_id: ServiceId) -> RepoResult<u32>;
}

impl AppointmentRepository for SqliteAgendaStore<'_> {
    fn create_appointment(&self, appointment: &Appointment) -> RepoResult<AppointmentId> {
        self.conn().execute(
            "INSERT INTO appointments (
                uuid,
                client_uuid,
                service_uuid,
                day_key,
                start_time,
                status,
                notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                appointment.id.to_string(),
                appointment.client_id.to_string(),
                appointment.service_id.to_string(),
                day_key(appointment.day()),
                format_minutes(appointment.start_minute()),
                status_to_db(appointment.status),
                appointment.notes.as_deref(),
            ],
        )?;
        Ok(appointment.id)
    }

    fn update_appointment(&self, appointment: &Appointment) -> RepoResult<()> {
        let changed = self.conn().execute(
            "UPDATE appointments
             SET
                client_uuid = ?2,
                service_uuid = ?3,
                day_key = ?4,
                start_time = ?5,
                status = ?6,
                notes = ?7,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                appointment.id.to_string(),
                appointment.client_id.to_string(),
                appointment.service_id.to_string(),
                day_key(appointment.day()),
                format_minutes(appointment.start_minute()),
                status_to_db(appointment.status),
                appointment.notes.as_deref(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(appointment.id));
        }
        Ok(())
    }

    fn get_appointment(&self, id: AppointmentId) -> RepoResult<Option<Appointment>> {
        let row = self
            .conn()
            .query_row(
                &format!("{APPOINTMENT_SELECT_SQL} WHERE uuid = ?1;"),
                [id.to_string()],
                |row| Ok(parse_appointment_row(row)),
            )
            .optional()?;
        row.transpose()
    }

    fn list_appointments_on_date(&self, date: NaiveDate) -> RepoResult<Vec<Appointment>> {
        self.list_appointments_between(date, date)
    }

    fn list_appointments_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepoResult<Vec<Appointment>> {
        let mut stmt = self.conn().prepare(&format!(
            "{APPOINTMENT_SELECT_SQL}
             WHERE day_key >= ?1
               AND day_key <= ?2
             ORDER BY day_key ASC, start_time ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query(params![day_key(from), day_key(to)])?;
        let mut appointments = Vec::new();
        while let Some(row) = rows.next()? {
            appointments.push(parse_appointment_row(row)?);
        }
        Ok(appointments)
    }

    fn count_active_appointments_for_service(&self, service_id: ServiceId) -> RepoResult<u32> {
        let count: u32 = self.conn().query_row(
            "SELECT COUNT(*)
             FROM appointments
             WHERE service_uuid = ?1
               AND status <> 'cancelled';",
            [service_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn parse_appointment_row(row: &Row<'_>) -> RepoResult<Appointment> {
    let uuid_text: String = row.get("uuid")?;
    let client_text: String = row.get("client_uuid")?;
    let service_text: String = row.get("service_uuid")?;

    let day_text: String = row.get("day_key")?;
    let date = parse_day_key(&day_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid daykey `{day_text}` in appointments.day_key"))
    })?;

    let time_text: String = row.get("start_time")?;
    let minute = to_minutes(&time_text)
        .map_err(|err| RepoError::InvalidData(format!("{err} in appointments.start_time")))?;
    let start_at = date
        .and_hms_opt(minute / 60, minute % 60, 0)
        .ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid start `{day_text}T{time_text}` in appointments"
            ))
        })?;

    let status_text: String = row.get("status")?;
    let status = parse_status(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid status `{status_text}` in appointments.status"
        ))
    })?;

    Ok(Appointment {
        id: parse_uuid(&uuid_text, "appointments.uuid")?,
        client_id: parse_uuid(&client_text, "appointments.client_uuid")?,
        service_id: parse_uuid(&service_text, "appointments.service_uuid")?,
        start_at,
        status,
        notes: row.get("notes")?,
    })
}

fn status_to_db(status: AppointmentStatus) -> &'static str {
    match status {
        AppointmentStatus::Confirmed => "confirmed",
        AppointmentStatus::Completed => "completed",
        AppointmentStatus::Cancelled => "cancelled",
    }
}

fn parse_status(value: &str) -> Option<AppointmentStatus> {
    match value {
        "confirmed" => Some(AppointmentStatus::Confirmed),
        "completed" => Some(AppointmentStatus::Completed),
        "cancelled" => Some(AppointmentStatus::Cancelled),
        _ => None,
    }
}
