//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls and the booking engine into use-case
//!   level APIs.
//! - Keep callers (CLI, future UI bindings) decoupled from storage details.

pub mod booking_service;
pub mod catalog_service;
pub mod client_service;
pub mod profile_service;

pub use booking_service::{BookingService, SlotQuery};
pub use catalog_service::{CatalogService, CatalogServiceError};
pub use client_service::{ClientService, ClientServiceError};
pub use profile_service::{NewOperatorProfile, ProfileService, ProfileServiceError};
