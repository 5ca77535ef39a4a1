//! Client use-cases. Removal is a soft delete.

use crate::model::client::{Client, ClientId, ClientPatch, ClientValidationError};
use crate::repo::{ClientRepository, RepoError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum ClientServiceError {
    Validation(ClientValidationError),
    ClientNotFound(ClientId),
    Repo(RepoError),
}

impl Display for ClientServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::ClientNotFound(id) => write!(f, "client not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ClientServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::ClientNotFound(_) => None,
        }
    }
}

impl From<ClientValidationError> for ClientServiceError {
    fn from(value: ClientValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ClientServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::ClientNotFound(id),
            other => Self::Repo(other),
        }
    }
}

pub struct ClientService<R: ClientRepository> {
    repo: R,
}

impl<R: ClientRepository> ClientService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_client(
        &self,
        name: impl Into<String>,
        phone: impl Into<String>,
    ) -> Result<Client, ClientServiceError> {
        let client = Client::new(name, phone);
        client.validate()?;
        self.repo.create_client(&client)?;
        info!("event=client_create module=client status=ok client_id={}", client.id);
        Ok(client)
    }

    /// Merges `patch` into the active record and validates the result.
    pub fn update_client(
        &self,
        id: ClientId,
        patch: &ClientPatch,
    ) -> Result<Client, ClientServiceError> {
        let current = self
            .repo
            .get_client(id, false)?
            .ok_or(ClientServiceError::ClientNotFound(id))?;
        let merged = patch.merge_into(&current);
        merged.validate()?;
        self.repo.update_client(&merged)?;
        info!("event=client_update module=client status=ok client_id={id}");
        Ok(merged)
    }

    /// Active client by id.
    pub fn get_client(&self, id: ClientId) -> Result<Option<Client>, ClientServiceError> {
        Ok(self.repo.get_client(id, false)?)
    }

    /// Active clients ordered by name.
    pub fn list_clients(&self) -> Result<Vec<Client>, ClientServiceError> {
        Ok(self.repo.list_clients(false)?)
    }

    pub fn remove_client(&self, id: ClientId) -> Result<(), ClientServiceError> {
        if self.repo.get_client(id, false)?.is_none() {
            return Err(ClientServiceError::ClientNotFound(id));
        }
        self.repo.soft_delete_client(id)?;
        info!("event=client_remove module=client status=ok client_id={id}");
        Ok(())
    }
}
