//! Client persistence.

use super::{bool_to_int, parse_flag, parse_uuid, RepoError, RepoResult, SqliteAgendaStore};
use crate::model::client::{Client, ClientId};
use rusqlite::{params, OptionalExtension, Row};

const CLIENT_SELECT_SQL: &str = "SELECT uuid, name, phone, is_deleted FROM clients";

pub trait ClientRepository {
    fn create_client(&self, client: &Client) -> RepoResult<ClientId>;
    fn update_client(&self, client: &Client) -> RepoResult<()>;
    fn get_client(&self, id: ClientId, include_deleted: bool) -> RepoResult<Option<Client>>;
    /// Lists clients ordered by name (case-insensitive), then id.
    fn list_clients(&self, include_deleted: bool) -> RepoResult<Vec<Client>>;
    fn soft_delete_client(&self, id: ClientId) -> RepoResult<()>;
}

impl ClientRepository for SqliteAgendaStore<'_> {
    fn create_client(&self, client: &Client) -> RepoResult<ClientId> {
        client
            .validate()
            .map_err(|err| RepoError::InvalidRecord(err.to_string()))?;

        self.conn().execute(
            "INSERT INTO clients (uuid, name, phone, is_deleted)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                client.id.to_string(),
                client.name.as_str(),
                client.phone.as_str(),
                bool_to_int(client.is_deleted),
            ],
        )?;
        Ok(client.id)
    }

    fn update_client(&self, client: &Client) -> RepoResult<()> {
        client
            .validate()
            .map_err(|err| RepoError::InvalidRecord(err.to_string()))?;

        let changed = self.conn().execute(
            "UPDATE clients
             SET
                name = ?2,
                phone = ?3,
                is_deleted = ?4,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                client.id.to_string(),
                client.name.as_str(),
                client.phone.as_str(),
                bool_to_int(client.is_deleted),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(client.id));
        }
        Ok(())
    }

    fn get_client(&self, id: ClientId, include_deleted: bool) -> RepoResult<Option<Client>> {
        let row = self
            .conn()
            .query_row(
                &format!(
                    "{CLIENT_SELECT_SQL}
                     WHERE uuid = ?1
                       AND (?2 = 1 OR is_deleted = 0);"
                ),
                params![id.to_string(), bool_to_int(include_deleted)],
                |row| Ok(parse_client_row(row)),
            )
            .optional()?;
        row.transpose()
    }

    fn list_clients(&self, include_deleted: bool) -> RepoResult<Vec<Client>> {
        let mut stmt = self.conn().prepare(&format!(
            "{CLIENT_SELECT_SQL}
             WHERE (?1 = 1 OR is_deleted = 0)
             ORDER BY name COLLATE NOCASE ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([bool_to_int(include_deleted)])?;
        let mut clients = Vec::new();
        while let Some(row) = rows.next()? {
            clients.push(parse_client_row(row)?);
        }
        Ok(clients)
    }

    fn soft_delete_client(&self, id: ClientId) -> RepoResult<()> {
        let changed = self.conn().execute(
            "UPDATE clients
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

fn parse_client_row(row: &Row<'_>) -> RepoResult<Client> {
    let uuid_text: String = row.get("uuid")?;
    Ok(Client {
        id: parse_uuid(&uuid_text, "clients.uuid")?,
        name: row.get("name")?,
        phone: row.get("phone")?,
        is_deleted: parse_flag(row.get("is_deleted")?, "clients.is_deleted")?,
    })
}
