//! Preferences loading and saving.
//!
//! `config.json` lives at the storage root. Missing or malformed files fall
//! back to defaults; only saving can fail.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AuditError, Result};
use crate::report::ReportGrouping;
use crate::storage::StorageConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Default grouping for markdown export.
    pub report_grouping: ReportGrouping,
    /// Remove empty sessions store-wide before each command.
    pub clean_on_start: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            report_grouping: ReportGrouping::Type,
            clean_on_start: false,
        }
    }
}

/// Loads preferences, returning defaults if the file is missing or corrupt.
pub fn load_config(storage: &StorageConfig) -> AuditConfig {
    let path = storage.config_file();
    let Ok(content) = fs_err::read_to_string(&path) else {
        return AuditConfig::default();
    };
    match serde_json::from_str::<AuditConfig>(&content) {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to parse config, using defaults");
            AuditConfig::default()
        }
    }
}

/// Saves preferences to disk.
pub fn save_config(storage: &StorageConfig, config: &AuditConfig) -> Result<()> {
    let path = storage.config_file();
    let content = serde_json::to_string_pretty(config).map_err(|e| AuditError::Serialize {
        context: path.display().to_string(),
        source: e,
    })?;
    fs_err::create_dir_all(storage.root())
        .and_then(|_| fs_err::write(&path, content))
        .map_err(|e| AuditError::Io {
            context: format!("writing config {}", path.display()),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_config_is_default() {
        let temp = TempDir::new().unwrap();
        let storage = StorageConfig::with_root(temp.path().to_path_buf());
        assert_eq!(load_config(&storage), AuditConfig::default());
    }

    #[test]
    fn corrupt_config_is_default() {
        let temp = TempDir::new().unwrap();
        let storage = StorageConfig::with_root(temp.path().to_path_buf());
        std::fs::write(storage.config_file(), "[1, 2").unwrap();
        assert_eq!(load_config(&storage), AuditConfig::default());
    }

    #[test]
    fn save_then_load() {
        let temp = TempDir::new().unwrap();
        let storage = StorageConfig::with_root(temp.path().join("nested"));
        let config = AuditConfig {
            report_grouping: ReportGrouping::File,
            clean_on_start: true,
        };
        save_config(&storage, &config).unwrap();
        assert_eq!(load_config(&storage), config);
    }

    #[test]
    fn partial_config_fills_defaults_and_ignores_unknown_keys() {
        let temp = TempDir::new().unwrap();
        let storage = StorageConfig::with_root(temp.path().to_path_buf());
        std::fs::write(
            storage.config_file(),
            r#"{"clean_on_start": true, "context_radius": 7}"#,
        )
        .unwrap();
        let config = load_config(&storage);
        assert!(config.clean_on_start);
        assert_eq!(config.report_grouping, ReportGrouping::Type);
    }
}
