//! Service catalog records.
//!
//! # Invariants
//! - `0 < duration_minutes <= 1440`; an appointment's length always comes
//!   from here.
//! - `price_cents >= 0`.
//! - Names are at least 3 characters after trim.

use crate::model::time::MINUTES_PER_DAY;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type ServiceId = Uuid;

const MIN_NAME_CHARS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceValidationError {
    BlankName,
    NameTooShort { chars: usize },
    NonPositiveDuration,
    /// Longer than one day.
    DurationTooLong { duration_minutes: u32 },
    NegativePrice { price_cents: i64 },
}

impl Display for ServiceValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "service name is required"),
            Self::NameTooShort { chars } => write!(
                f,
                "service name must have at least {MIN_NAME_CHARS} characters, got {chars}"
            ),
            Self::NonPositiveDuration => write!(f, "service duration must be greater than 0"),
            Self::DurationTooLong { duration_minutes } => write!(
                f,
                "service duration must be at most {MINUTES_PER_DAY} minutes, got {duration_minutes}"
            ),
            Self::NegativePrice { price_cents } => {
                write!(f, "service price must not be negative, got {price_cents} cents")
            }
        }
    }
}

impl Error for ServiceValidationError {}

/// A bookable service (haircut, beard trim, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    pub duration_minutes: u32,
    pub price_cents: i64,
    pub is_deleted: bool,
}

impl Service {
    pub fn new(name: impl Into<String>, duration_minutes: u32, price_cents: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into().trim().to_string(),
            duration_minutes,
            price_cents,
            is_deleted: false,
        }
    }

    pub fn validate(&self) -> Result<(), ServiceValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ServiceValidationError::BlankName);
        }
        let chars = name.chars().count();
        if chars < MIN_NAME_CHARS {
            return Err(ServiceValidationError::NameTooShort { chars });
        }
        if self.duration_minutes == 0 {
            return Err(ServiceValidationError::NonPositiveDuration);
        }
        if self.duration_minutes > MINUTES_PER_DAY {
            return Err(ServiceValidationError::DurationTooLong {
                duration_minutes: self.duration_minutes,
            });
        }
        if self.price_cents < 0 {
            return Err(ServiceValidationError::NegativePrice {
                price_cents: self.price_cents,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServicePatch {
    pub name: Option<String>,
    pub duration_minutes: Option<u32>,
    pub price_cents: Option<i64>,
}

impl ServicePatch {
    pub fn merge_into(&self, current: &Service) -> Service {
        let mut merged = current.clone();
        if let Some(name) = &self.name {
            merged.name = name.trim().to_string();
        }
        if let Some(duration) = self.duration_minutes {
            merged.duration_minutes = duration;
        }
        if let Some(price) = self.price_cents {
            merged.price_cents = price;
        }
        merged
    }
}
