//! Service catalog use-cases.
//!
//! # Invariants
//! - Active service names are unique, compared case-insensitively.
//! - A service referenced by a non-cancelled appointment cannot be removed.
//! - Removal is a soft delete; history keeps resolving the duration.

use crate::model::catalog::{Service, ServiceId, ServicePatch, ServiceValidationError};
use crate::repo::{AgendaStore, RepoError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum CatalogServiceError {
    Validation(ServiceValidationError),
    DuplicateName(String),
    ServiceNotFound(ServiceId),
    ServiceInUse { active_appointments: u32 },
    Repo(RepoError),
}

impl Display for CatalogServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateName(name) => write!(f, "a service named `{name}` already exists"),
            Self::ServiceNotFound(id) => write!(f, "service not found: {id}"),
            Self::ServiceInUse {
                active_appointments,
            } => write!(
                f,
                "service is used by {active_appointments} active appointment(s)"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CatalogServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ServiceValidationError> for CatalogServiceError {
    fn from(value: ServiceValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for CatalogServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::ServiceNotFound(id),
            other => Self::Repo(other),
        }
    }
}

pub struct CatalogService<S: AgendaStore> {
    store: S,
}

impl<S: AgendaStore> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn create_service(
        &self,
        name: impl Into<String>,
        duration_minutes: u32,
        price_cents: i64,
    ) -> Result<Service, CatalogServiceError> {
        let service = Service::new(name, duration_minutes, price_cents);
        service.validate()?;
        self.store
            .atomically(|store| -> Result<(), CatalogServiceError> {
                ensure_name_free(store, &service)?;
                store.create_service(&service)?;
                Ok(())
            })?;
        info!(
            "event=service_create module=catalog status=ok service_id={} duration={}",
            service.id, service.duration_minutes
        );
        Ok(service)
    }

    /// Merges `patch` into the active record and validates the result.
    ///
    /// Changing a duration does not re-validate existing bookings.
    pub fn update_service(
        &self,
        id: ServiceId,
        patch: &ServicePatch,
    ) -> Result<Service, CatalogServiceError> {
        let merged = self
            .store
            .atomically(|store| -> Result<Service, CatalogServiceError> {
                let current = store
                    .get_service(id, false)?
                    .ok_or(CatalogServiceError::ServiceNotFound(id))?;
                let merged = patch.merge_into(&current);
                merged.validate()?;
                ensure_name_free(store, &merged)?;
                store.update_service(&merged)?;
                Ok(merged)
            })?;
        info!(
            "event=service_update module=catalog status=ok service_id={id} duration={}",
            merged.duration_minutes
        );
        Ok(merged)
    }

    pub fn get_service(&self, id: ServiceId) -> Result<Option<Service>, CatalogServiceError> {
        Ok(self.store.get_service(id, false)?)
    }

    /// Active services ordered by name.
    pub fn list_services(&self) -> Result<Vec<Service>, CatalogServiceError> {
        Ok(self.store.list_services(false)?)
    }

    pub fn remove_service(&self, id: ServiceId) -> Result<(), CatalogServiceError> {
        let result = self
            .store
            .atomically(|store| -> Result<(), CatalogServiceError> {
                if store.get_service(id, false)?.is_none() {
                    return Err(CatalogServiceError::ServiceNotFound(id));
                }
                let active_appointments = store.count_active_appointments_for_service(id)?;
                if active_appointments > 0 {
                    return Err(CatalogServiceError::ServiceInUse {
                        active_appointments,
                    });
                }
                Ok(store.soft_delete_service(id)?)
            });

        match &result {
            Ok(()) => info!("event=service_remove module=catalog status=ok service_id={id}"),
            Err(CatalogServiceError::ServiceInUse {
                active_appointments,
            }) => info!(
                "event=service_remove module=catalog status=rejected service_id={id} reason=service_in_use active_appointments={active_appointments}"
            ),
            Err(_) => {}
        }
        result
    }
}

fn ensure_name_free<S: AgendaStore>(store: &S, candidate: &Service) -> Result<(), CatalogServiceError> {
    match store.find_active_service_by_name(&candidate.name)? {
        Some(existing) if existing.id != candidate.id => {
            Err(CatalogServiceError::DuplicateName(candidate.name.clone()))
        }
        _ => Ok(()),
    }
}
