//! Core runtime configuration.
//!
//! # Responsibility
//! - Load `CoreConfig` from a JSON file, falling back to defaults per field.
//! - Reject settings the rest of the core cannot honor.

use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_DB_FILE: &str = "slotbook.sqlite3";

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// Absolute directory for rolling log files; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    /// Slot step when a query leaves it open; `None` steps by the duration.
    pub default_slot_step_minutes: Option<u32>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            log_level: default_log_level().to_string(),
            log_dir: None,
            default_slot_step_minutes: None,
        }
    }
}

impl CoreConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("db_path cannot be empty".to_string()));
        }
        if let Some(log_dir) = &self.log_dir {
            if !log_dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be an absolute path, got `{}`",
                    log_dir.display()
                )));
            }
        }
        if self.default_slot_step_minutes == Some(0) {
            return Err(ConfigError::Invalid(
                "default_slot_step_minutes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = CoreConfig::from_json(r#"{ "db_path": "/tmp/agenda.sqlite3" }"#).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/agenda.sqlite3"));
        assert_eq!(config.log_level, default_log_level());
        assert_eq!(config.default_slot_step_minutes, None);
    }

    #[test]
    fn relative_log_dir_and_zero_step_are_rejected() {
        let err = CoreConfig::from_json(r#"{ "log_dir": "logs" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = CoreConfig::from_json(r#"{ "default_slot_step_minutes": 0 }"#).unwrap_err();
        assert!(err.to_string().contains("positive"));
    }

    #[test]
    fn unknown_keys_and_bad_json_are_parse_errors() {
        assert!(matches!(
            CoreConfig::from_json(r#"{ "db": "x" }"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            CoreConfig::from_json("{"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_reads_file_and_reports_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slotbook.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, r#"{{ "default_slot_step_minutes": 15 }}"#).unwrap();

        let config = CoreConfig::load(&path).unwrap();
        assert_eq!(config.default_slot_step_minutes, Some(15));

        let err = CoreConfig::load(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
