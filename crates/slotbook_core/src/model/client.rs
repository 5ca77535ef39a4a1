//! Client records.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type ClientId = Uuid;

const MIN_PHONE_DIGITS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientValidationError {
    BlankName,
    /// Phone has fewer than 10 digits (area code + number).
    IncompletePhone { digits: usize },
}

impl Display for ClientValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "client name must not be blank"),
            Self::IncompletePhone { digits } => write!(
                f,
                "client phone looks incomplete: {digits} digits, expected at least {MIN_PHONE_DIGITS}"
            ),
        }
    }
}

impl Error for ClientValidationError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub phone: String,
    /// Soft delete tombstone; past appointments keep resolving the client.
    pub is_deleted: bool,
}

impl Client {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into().trim().to_string(),
            phone: phone.into().trim().to_string(),
            is_deleted: false,
        }
    }

    pub fn validate(&self) -> Result<(), ClientValidationError> {
        if self.name.trim().is_empty() {
            return Err(ClientValidationError::BlankName);
        }
        let digits = self.phone.chars().filter(char::is_ascii_digit).count();
        if digits < MIN_PHONE_DIGITS {
            return Err(ClientValidationError::IncompletePhone { digits });
        }
        Ok(())
    }
}

/// Partial client update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
}

impl ClientPatch {
    pub fn merge_into(&self, current: &Client) -> Client {
        let mut merged = current.clone();
        if let Some(name) = &self.name {
            merged.name = name.trim().to_string();
        }
        if let Some(phone) = &self.phone {
            merged.phone = phone.trim().to_string();
        }
        merged
    }
}
