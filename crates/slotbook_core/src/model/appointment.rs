//! Appointment records and the write-path request shapes.
//!
//! # Invariants
//! - `start_at` is operator-local wall clock with minute precision.
//! - The end is derived from the referenced service at validation time and
//!   never stored as a trusted value.
//! - Cancelled appointments stay in storage and never occupy time.

use crate::model::catalog::{Service, ServiceId};
use crate::model::client::{Client, ClientId};
use crate::model::time::minute_of_day;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type AppointmentId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    /// Booked and expected to happen.
    Confirmed,
    /// Service delivered.
    Completed,
    /// Kept for history; ignored by every occupancy rule.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub client_id: ClientId,
    pub service_id: ServiceId,
    pub start_at: NaiveDateTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
}

impl Appointment {
    pub fn day(&self) -> NaiveDate {
        self.start_at.date()
    }

    pub fn start_minute(&self) -> u32 {
        minute_of_day(self.start_at.time())
    }

    /// Whether this appointment takes up time on the operator's day.
    pub fn occupies_time(&self) -> bool {
        self.status != AppointmentStatus::Cancelled
    }

    pub fn end_at(&self, duration_minutes: u32) -> NaiveDateTime {
        self.start_at + Duration::minutes(i64::from(duration_minutes))
    }
}

/// Create request as received from the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAppointment {
    pub client_id: ClientId,
    pub service_id: ServiceId,
    /// `YYYY-MM-DDTHH:MM`, operator-local.
    pub start_at: String,
    /// Defaults to `Confirmed`.
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
}

/// Partial update; `None` keeps the stored value.
///
/// `notes: Some(None)` clears the notes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentPatch {
    pub client_id: Option<ClientId>,
    pub service_id: Option<ServiceId>,
    pub start_at: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub notes: Option<Option<String>>,
}

impl AppointmentPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Read-only denormalized view for agenda screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppointmentWithDetails {
    pub appointment: Appointment,
    pub client: Client,
    pub service: Service,
    pub end_at: NaiveDateTime,
}

impl AppointmentWithDetails {
    pub fn assemble(appointment: Appointment, client: Client, service: Service) -> Self {
        let end_at = appointment.end_at(service.duration_minutes);
        Self {
            appointment,
            client,
            service,
            end_at,
        }
    }
}
