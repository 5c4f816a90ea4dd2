use crate::core::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "DATAROOM_DATA_DIR";

/// Describes where and how the entry store persists its data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    /// Keep everything in memory; nothing survives the process.
    pub ephemeral: bool,
    /// Flush the database to disk before a mutation returns.
    pub flush_on_write: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            ephemeral: false,
            flush_on_write: true,
        }
    }
}

impl StoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn ephemeral() -> Self {
        Self {
            ephemeral: true,
            ..Self::default()
        }
    }

    /// Reads an optional JSON config file, then applies the
    /// `DATAROOM_DATA_DIR` override.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = fs::read_to_string(path).map_err(|e| {
                    Error::StorageUnavailable(format!(
                        "cannot read config '{}': {e}",
                        path.display()
                    ))
                })?;
                serde_json::from_str(&raw).map_err(|e| {
                    Error::StorageUnavailable(format!(
                        "invalid config '{}': {e}",
                        path.display()
                    ))
                })?
            }
            None => Self::default(),
        };

        if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
            config.data_dir = PathBuf::from(dir);
        }
        Ok(config)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".dataroom")
        .join("db")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn partial_config_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dataroom.json");
        fs::write(&path, r#"{ "flush_on_write": false }"#).unwrap();

        let config = StoreConfig::load(Some(path.as_path())).unwrap();
        assert!(!config.flush_on_write);
        assert!(!config.ephemeral);
    }

    #[test]
    fn unreadable_config_is_reported() {
        let dir = TempDir::new().unwrap();
        let result = StoreConfig::load(Some(dir.path().join("missing.json").as_path()));
        assert!(matches!(result, Err(Error::StorageUnavailable(_))));
    }
}
