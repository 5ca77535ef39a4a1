//! Operator profile use-cases.
//!
//! # Invariants
//! - Exactly one profile may exist; a second create is refused.
//! - Updates merge the patch into the stored profile and re-validate the
//!   working window and break before committing.

use crate::model::operator::{
    OperatorProfile, OperatorProfilePatch, OperatorSchedule, ProfileValidationError,
};
use crate::repo::{AgendaStore, RepoError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum ProfileServiceError {
    Validation(ProfileValidationError),
    ProfileAlreadyExists,
    ProfileNotFound,
    Repo(RepoError),
}

impl Display for ProfileServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::ProfileAlreadyExists => write!(f, "operator profile already exists"),
            Self::ProfileNotFound => write!(f, "operator profile not found"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProfileServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ProfileValidationError> for ProfileServiceError {
    fn from(value: ProfileValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ProfileServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::ProfileNotFound => Self::ProfileNotFound,
            other => Self::Repo(other),
        }
    }
}

/// Onboarding input. Break boundaries must be given together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewOperatorProfile {
    pub display_name: String,
    pub work_start: String,
    pub work_end: String,
    pub break_start: Option<String>,
    pub break_end: Option<String>,
}

impl NewOperatorProfile {
    fn build(&self) -> Result<OperatorProfile, ProfileValidationError> {
        let break_window = match (&self.break_start, &self.break_end) {
            (Some(start), Some(end)) => Some((start.as_str(), end.as_str())),
            (None, None) => None,
            _ => return Err(ProfileValidationError::IncompleteBreak),
        };
        let profile = OperatorProfile {
            display_name: self.display_name.trim().to_string(),
            schedule: OperatorSchedule::from_hhmm(&self.work_start, &self.work_end, break_window)?,
        };
        profile.validate()?;
        Ok(profile)
    }
}

pub struct ProfileService<S: AgendaStore> {
    store: S,
}

impl<S: AgendaStore> ProfileService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn get_operator_profile(&self) -> Result<Option<OperatorProfile>, ProfileServiceError> {
        Ok(self.store.get_operator_profile()?)
    }

    pub fn create_operator_profile(
        &self,
        input: &NewOperatorProfile,
    ) -> Result<OperatorProfile, ProfileServiceError> {
        let profile = input.build()?;
        self.store
            .atomically(|store| -> Result<(), ProfileServiceError> {
                if store.get_operator_profile()?.is_some() {
                    return Err(ProfileServiceError::ProfileAlreadyExists);
                }
                Ok(store.insert_operator_profile(&profile)?)
            })?;

        info!(
            "event=profile_create module=profile status=ok work={} has_break={}",
            profile.schedule.work_window(),
            profile.schedule.break_window.is_some()
        );
        Ok(profile)
    }

    pub fn update_operator_profile(
        &self,
        patch: &OperatorProfilePatch,
    ) -> Result<OperatorProfile, ProfileServiceError> {
        let merged = self
            .store
            .atomically(|store| -> Result<OperatorProfile, ProfileServiceError> {
                let current = store
                    .get_operator_profile()?
                    .ok_or(ProfileServiceError::ProfileNotFound)?;
                let merged = patch.merge_into(&current)?;
                store.update_operator_profile(&merged)?;
                Ok(merged)
            })?;

        info!(
            "event=profile_update module=profile status=ok work={} has_break={}",
            merged.schedule.work_window(),
            merged.schedule.break_window.is_some()
        );
        Ok(merged)
    }
}
