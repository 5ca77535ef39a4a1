//! Singleton operator profile persistence.
//!
//! # Invariants
//! - At most one row exists (`id = 1`, enforced by a CHECK constraint).
//! - Break start/end are stored together or not at all.

use super::{RepoError, RepoResult, SqliteAgendaStore};
use crate::model::operator::{OperatorProfile, OperatorSchedule};
use crate::model::time::{format_minutes, to_minutes, MinuteRange};
use rusqlite::{params, OptionalExtension, Row};

const PROFILE_ROW_ID: i64 = 1;

pub trait ProfileRepository {
    /// Returns the operator profile, or `None` before onboarding.
    fn get_operator_profile(&self) -> RepoResult<Option<OperatorProfile>>;
    /// Inserts the singleton profile row.
    fn insert_operator_profile(&self, profile: &OperatorProfile) -> RepoResult<()>;
    /// Replaces the stored profile.
    fn update_operator_profile(&self, profile: &OperatorProfile) -> RepoResult<()>;
}

impl ProfileRepository for SqliteAgendaStore<'_> {
    fn get_operator_profile(&self) -> RepoResult<Option<OperatorProfile>> {
        let profile = self
            .conn()
            .query_row(
                "SELECT display_name, work_start, work_end, break_start, break_end
                 FROM operator_profile
                 WHERE id = ?1;",
                [PROFILE_ROW_ID],
                |row| Ok(RawProfileRow::from_row(row)),
            )
            .optional()?;

        match profile {
            Some(raw) => Ok(Some(raw?.into_profile()?)),
            None => Ok(None),
        }
    }

    fn insert_operator_profile(&self, profile: &OperatorProfile) -> RepoResult<()> {
        profile
            .validate()
            .map_err(|err| RepoError::InvalidRecord(err.to_string()))?;
        let (break_start, break_end) = break_columns(&profile.schedule);

        self.conn().execute(
            "INSERT INTO operator_profile (
                id, display_name, work_start, work_end, break_start, break_end
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                PROFILE_ROW_ID,
                profile.display_name.as_str(),
                format_minutes(profile.schedule.work_start),
                format_minutes(profile.schedule.work_end),
                break_start,
                break_end,
            ],
        )?;
        Ok(())
    }

    fn update_operator_profile(&self, profile: &OperatorProfile) -> RepoResult<()> {
        profile
            .validate()
            .map_err(|err| RepoError::InvalidRecord(err.to_string()))?;
        let (break_start, break_end) = break_columns(&profile.schedule);

        let changed = self.conn().execute(
            "UPDATE operator_profile
             SET
                display_name = ?2,
                work_start = ?3,
                work_end = ?4,
                break_start = ?5,
                break_end = ?6,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                PROFILE_ROW_ID,
                profile.display_name.as_str(),
                format_minutes(profile.schedule.work_start),
                format_minutes(profile.schedule.work_end),
                break_start,
                break_end,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::ProfileNotFound);
        }
        Ok(())
    }
}

fn break_columns(schedule: &OperatorSchedule) -> (Option<String>, Option<String>) {
    match schedule.break_window {
        Some(window) => (
            Some(format_minutes(window.start)),
            Some(format_minutes(window.end)),
        ),
        None => (None, None),
    }
}

struct RawProfileRow {
    display_name: String,
    work_start: String,
    work_end: String,
    break_start: Option<String>,
    break_end: Option<String>,
}

impl RawProfileRow {
    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            display_name: row.get("display_name")?,
            work_start: row.get("work_start")?,
            work_end: row.get("work_end")?,
            break_start: row.get("break_start")?,
            break_end: row.get("break_end")?,
        })
    }

    fn into_profile(self) -> RepoResult<OperatorProfile> {
        let minutes = |value: &str, column: &str| {
            to_minutes(value).map_err(|err| {
                RepoError::InvalidData(format!("{err} in operator_profile.{column}"))
            })
        };

        let break_window = match (self.break_start.as_deref(), self.break_end.as_deref()) {
            (Some(start), Some(end)) => Some(MinuteRange::new(
                minutes(start, "break_start")?,
                minutes(end, "break_end")?,
            )),
            (None, None) => None,
            _ => {
                return Err(RepoError::InvalidData(
                    "operator_profile break_start/break_end must be set together".to_string(),
                ))
            }
        };

        let profile = OperatorProfile {
            display_name: self.display_name,
            schedule: OperatorSchedule {
                work_start: minutes(&self.work_start, "work_start")?,
                work_end: minutes(&self.work_end, "work_end")?,
                break_window,
            },
        };
        profile
            .validate()
            .map_err(|err| RepoError::InvalidData(format!("operator_profile: {err}")))?;
        Ok(profile)
    }
}
