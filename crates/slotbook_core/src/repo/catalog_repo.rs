//! Service catalog persistence.
//!
//! # Invariants
//! - Soft-deleted services stay resolvable by id so past appointments keep
//!   their duration.
//! - Duration and price constraints are mirrored by table CHECKs.

use super::{bool_to_int, parse_flag, parse_uuid, RepoError, RepoResult, SqliteAgendaStore};
use crate::model::catalog::{Service, ServiceId};
use rusqlite::{params, OptionalExtension, Row};

const SERVICE_SELECT_SQL: &str =
    "SELECT uuid, name, duration_minutes, price_cents, is_deleted FROM services";

pub trait CatalogRepository {
    fn create_service(&self, service: &Service) -> RepoResult<ServiceId>;
    fn update_service(&self, service: &Service) -> RepoResult<()>;
    fn get_service(&self, id: ServiceId, include_deleted: bool) -> RepoResult<Option<Service>>;
    /// Lists services ordered by name (case-insensitive), then id.
    fn list_services(&self, include_deleted: bool) -> RepoResult<Vec<Service>>;
    /// Finds an active service whose name matches case-insensitively.
    fn find_active_service_by_name(&self, name: &str) -> RepoResult<Option<Service>>;
    fn soft_delete_service(&self, id: ServiceId) -> RepoResult<()>;
}

impl CatalogRepository for SqliteAgendaStore<'_> {
    fn create_service(&self, service: &Service) -> RepoResult<ServiceId> {
        service
            .validate()
            .map_err(|err| RepoError::InvalidRecord(err.to_string()))?;

        self.conn().execute(
            "INSERT INTO services (uuid, name, duration_minutes, price_cents, is_deleted)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                service.id.to_string(),
                service.name.as_str(),
                service.duration_minutes,
                service.price_cents,
                bool_to_int(service.is_deleted),
            ],
        )?;
        Ok(service.id)
    }

    fn update_service(&self, service: &Service) -> RepoResult<()> {
        service
            .validate()
            .map_err(|err| RepoError::InvalidRecord(err.to_string()))?;

        let changed = self.conn().execute(
            "UPDATE services
             SET
                name = ?2,
                duration_minutes = ?3,
                price_cents = ?4,
                is_deleted = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                service.id.to_string(),
                service.name.as_str(),
                service.duration_minutes,
                service.price_cents,
                bool_to_int(service.is_deleted),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(service.id));
        }
        Ok(())
    }

    fn get_service(&self, id: ServiceId, include_deleted: bool) -> RepoResult<Option<Service>> {
        let row = self
            .conn()
            .query_row(
                &format!(
                    "{SERVICE_SELECT_SQL}
                     WHERE uuid = ?1
                       AND (?2 = 1 OR is_deleted = 0);"
                ),
                params![id.to_string(), bool_to_int(include_deleted)],
                |row| Ok(parse_service_row(row)),
            )
            .optional()?;
        row.transpose()
    }

    fn list_services(&self, include_deleted: bool) -> RepoResult<Vec<Service>> {
        let mut stmt = self.conn().prepare(&format!(
            "{SERVICE_SELECT_SQL}
             WHERE (?1 = 1 OR is_deleted = 0)
             ORDER BY name COLLATE NOCASE ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([bool_to_int(include_deleted)])?;
        let mut services = Vec::new();
        while let Some(row) = rows.next()? {
            services.push(parse_service_row(row)?);
        }
        Ok(services)
    }

    fn find_active_service_by_name(&self, name: &str) -> RepoResult<Option<Service>> {
        let row = self
            .conn()
            .query_row(
                &format!(
                    "{SERVICE_SELECT_SQL}
                     WHERE name = ?1 COLLATE NOCASE
                       AND is_deleted = 0
                     ORDER BY uuid ASC
                     LIMIT 1;"
                ),
                [name.trim()],
                |row| Ok(parse_service_row(row)),
            )
            .optional()?;
        row.transpose()
    }

    fn soft_delete_service(&self, id: ServiceId) -> RepoResult<()> {
        let changed = self.conn().execute(
            "UPDATE services
             SET
                is_deleted = 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

fn parse_service_row(row: &Row<'_>) -> RepoResult<Service> {
    let uuid_text: String = row.get("uuid")?;
    let duration: i64 = row.get("duration_minutes")?;
    let duration_minutes = u32::try_from(duration)
        .ok()
        .filter(|value| *value > 0)
        .ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid duration `{duration}` in services.duration_minutes"
            ))
        })?;

    let service = Service {
        id: parse_uuid(&uuid_text, "services.uuid")?,
        name: row.get("name")?,
        duration_minutes,
        price_cents: row.get("price_cents")?,
        is_deleted: parse_flag(row.get("is_deleted")?, "services.is_deleted")?,
    };
    service
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("services row {}: {err}", service.id)))?;
    Ok(service)
}
