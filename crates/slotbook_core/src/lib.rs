//! Offline scheduling core for a single-operator barbershop.
//! Owns the booking rules; callers only render and collect input.

pub mod booking;
pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use booking::{BookingError, BookingResult, ReferenceKind};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LoggingError,
};
pub use model::appointment::{
    Appointment, AppointmentId, AppointmentPatch, AppointmentStatus, AppointmentWithDetails,
    NewAppointment,
};
pub use model::catalog::{Service, ServiceId, ServicePatch};
pub use model::client::{Client, ClientId, ClientPatch};
pub use model::operator::{OperatorProfile, OperatorProfilePatch, ScheduleEnvelope};
pub use repo::{AgendaStore, RepoError, RepoResult, SqliteAgendaStore};
pub use service::{
    BookingService, CatalogService, CatalogServiceError, ClientService, ClientServiceError,
    NewOperatorProfile, ProfileService, ProfileServiceError, SlotQuery,
};

/// Health probe used by the CLI.
pub fn ping() -> &'static str {
    "pong"
}

pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
