//! Domain model for the booking core.
//!
//! # Responsibility
//! - Define the records shared by repositories, services and the booking engine.
//! - Keep wall-clock time arithmetic in one place (`time`).
//!
//! # Invariants
//! - Every client, service and appointment is identified by a stable UUID.
//! - Clients and services are tombstoned, never hard-deleted by core.
//! - Appointments are never removed by core; cancellation is a status.

pub mod appointment;
pub mod catalog;
pub mod client;
pub mod operator;
pub mod time;
