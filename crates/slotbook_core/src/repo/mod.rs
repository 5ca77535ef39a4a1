//! Repository contracts and the SQLite agenda store.
//!
//! # Responsibility
//! - Define one data-access contract per aggregate (profile, clients,
//!   catalog, appointments).
//! - Provide `AgendaStore`, the composite collaborator the booking engine
//!   runs against, with a validate-then-write unit of work.
//!
//! # Invariants
//! - Write paths validate records before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - `atomically` runs its closure inside one IMMEDIATE transaction; reads
//!   done inside it cannot be invalidated by another writer before commit.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod appointment_repo;
pub mod catalog_repo;
pub mod client_repo;
pub mod profile_repo;

pub use appointment_repo::AppointmentRepository;
pub use catalog_repo::CatalogRepository;
pub use client_repo::ClientRepository;
pub use profile_repo::ProfileRepository;

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence failures shared by every agenda repository.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Write targeted a row that does not exist.
    NotFound(Uuid),
    /// Operator profile row is missing on update.
    ProfileNotFound,
    /// Record failed its model validation on the write path.
    InvalidRecord(String),
    /// Persisted row cannot be mapped back to a valid record.
    InvalidData(String),
    /// Connection was not opened through `db::open_db*`.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::ProfileNotFound => write!(f, "operator profile not found"),
            Self::InvalidRecord(message) => write!(f, "invalid record: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Everything the booking engine needs from persistence.
pub trait AgendaStore:
    ProfileRepository + ClientRepository + CatalogRepository + AppointmentRepository
{
    /// Runs `op` as one unit of work; any `Err` rolls back its writes.
    ///
    /// Calls must not nest.
    fn atomically<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<RepoError>;
}

/// SQLite-backed agenda store over a borrowed, migrated connection.
#[derive(Clone, Copy)]
pub struct SqliteAgendaStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAgendaStore<'conn> {
    /// Wraps a connection returned by `db::open_db*`.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_agenda_connection_ready(conn)?;
        Ok(Self { conn })
    }

    pub(crate) fn conn(&self) -> &'conn Connection {
        self.conn
    }
}

impl AgendaStore for SqliteAgendaStore<'_> {
    fn atomically<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<RepoError>,
    {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(RepoError::from)?;
        let value = op(self)?;
        tx.commit().map_err(RepoError::from)?;
        Ok(value)
    }
}

fn ensure_agenda_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in ["operator_profile", "clients", "services", "appointments"] {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }

    Ok(())
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn parse_flag(value: i64, column: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
