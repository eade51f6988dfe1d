//! Application settings persisted as a small JSON file.
//!
//! # Responsibility
//! - Hold the data directory, log level, theme and last opened board.
//! - Load settings leniently and save them atomically.
//!
//! # Invariants
//! - A missing or malformed settings file yields defaults, never an error.
//! - `log_level` is always one of the levels accepted by logging bootstrap.

use crate::logging::{default_log_level, normalize_level, LoggingError};
use crate::model::entity::BoardId;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File name of the SQLite document inside `data_dir`.
pub const DATABASE_FILE_NAME: &str = "studynote.sqlite3";
/// File name of the settings file inside `data_dir`.
pub const CONFIG_FILE_NAME: &str = "config.json";
const LOG_DIR_NAME: &str = "logs";

/// Errors from saving or validating settings.
#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Serialize(serde_json::Error),
    InvalidLogLevel(LoggingError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "config io error: {err}"),
            Self::Serialize(err) => write!(f, "config serialize error: {err}"),
            Self::InvalidLogLevel(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Serialize(err) => Some(err),
            Self::InvalidLogLevel(err) => Some(err),
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

/// UI color scheme remembered between sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Persisted application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    /// Directory holding the database, logs and assets.
    pub data_dir: PathBuf,
    pub log_level: String,
    pub theme: Theme,
    /// Board shown on startup.
    pub last_board: Option<BoardId>,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            log_level: default_log_level().to_string(),
            theme: Theme::default(),
            last_board: None,
        }
    }
}

impl StudyConfig {
    /// Reads settings from `path`, falling back to defaults.
    ///
    /// Unknown log levels are replaced with the build default.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Self::default(),
            Err(err) => {
                warn!(
                    "event=config_load module=config status=error path={} error={err}",
                    path.display()
                );
                return Self::default();
            }
        };

        let mut config = match serde_json::from_str::<Self>(&raw) {
            Ok(config) => config,
            Err(err) => {
                warn!(
                    "event=config_load module=config status=error path={} error={err}",
                    path.display()
                );
                return Self::default();
            }
        };
        match normalize_level(&config.log_level) {
            Ok(level) => config.log_level = level.to_string(),
            Err(err) => {
                warn!("event=config_load module=config status=fallback error={err}");
                config.log_level = default_log_level().to_string();
            }
        }
        config
    }

    /// Writes settings to `path` through a temp file and rename.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        normalize_level(&self.log_level).map_err(ConfigError::InvalidLogLevel)?;
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec_pretty(self)?;
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, path)?;
        info!(
            "event=config_save module=config status=ok path={}",
            path.display()
        );
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE_NAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join(LOG_DIR_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, StudyConfig, Theme, DATABASE_FILE_NAME};
    use std::fs;
    use uuid::Uuid;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = StudyConfig::load_or_default(dir.path().join("config.json"));
        assert_eq!(config, StudyConfig::default());
    }

    #[test]
    fn malformed_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(StudyConfig::load_or_default(&path), StudyConfig::default());
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = StudyConfig {
            data_dir: dir.path().to_path_buf(),
            log_level: "warn".to_string(),
            theme: Theme::Dark,
            last_board: Some(Uuid::new_v4()),
        };
        config.save(&path).unwrap();
        assert_eq!(StudyConfig::load_or_default(&path), config);
        assert_eq!(
            config.database_path(),
            dir.path().join(DATABASE_FILE_NAME)
        );
    }

    #[test]
    fn partial_file_fills_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"theme":"dark","log_level":"WARNING"}"#).unwrap();
        let config = StudyConfig::load_or_default(&path);
        assert_eq!(config.theme, Theme::Dark);
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.data_dir, StudyConfig::default().data_dir);
    }

    #[test]
    fn save_rejects_unknown_log_level() {
        let dir = tempfile::tempdir().unwrap();
        let config = StudyConfig {
            log_level: "loud".to_string(),
            ..StudyConfig::default()
        };
        let error = config.save(dir.path().join("config.json")).unwrap_err();
        assert!(matches!(error, ConfigError::InvalidLogLevel(_)));
    }
}
