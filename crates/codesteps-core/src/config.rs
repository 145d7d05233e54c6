//! Configuration for a Codesteps installation.
//!
//! Settings come from `codesteps.json` in the working directory. Every key is
//! optional; a missing file means all defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CodestepsError, Result};

/// The default config file name.
pub const CONFIG_FILE_NAME: &str = "codesteps.json";

/// Default catalog file path.
fn default_catalog() -> String {
    "data/modules.json".to_string()
}

/// Default directory for persisted progress.
fn default_data_dir() -> String {
    ".codesteps".to_string()
}

/// Default output directory for reports.
fn default_report_dir() -> String {
    ".".to_string()
}

/// Main configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Path to the catalog file.
    #[serde(default = "default_catalog")]
    pub catalog: String,

    /// Directory holding the progress record.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Output directory for generated reports.
    #[serde(default = "default_report_dir")]
    pub report_dir: String,

    /// Fixed seed for puzzle shuffles. Random when unset.
    #[serde(default)]
    pub shuffle_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: default_catalog(),
            data_dir: default_data_dir(),
            report_dir: default_report_dir(),
            shuffle_seed: None,
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if `codesteps.json` exists but is invalid.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            CodestepsError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads `codesteps.json` from `dir`, or defaults if there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is invalid.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// If the file does not exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns `CodestepsError::ConfigParseError` if the file cannot be read
    /// or holds invalid JSON, and `CodestepsError::ConfigValidationError` if
    /// a value is invalid.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(CodestepsError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| CodestepsError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// All paths must be non-blank.
    ///
    /// # Errors
    ///
    /// Returns `CodestepsError::ConfigValidationError` if any check fails.
    pub fn validate(&self) -> Result<()> {
        if self.catalog.trim().is_empty() {
            return Err(CodestepsError::config_validation(
                "catalog path must not be empty",
                "Point 'catalog' at your modules JSON file in codesteps.json",
            ));
        }

        if self.data_dir.trim().is_empty() {
            return Err(CodestepsError::config_validation(
                "dataDir must not be empty",
                "Provide a directory for progress data in codesteps.json (default '.codesteps')",
            ));
        }

        if self.report_dir.trim().is_empty() {
            return Err(CodestepsError::config_validation(
                "reportDir must not be empty",
                "Provide a valid report directory in codesteps.json (use '.' for current directory)",
            ));
        }

        Ok(())
    }
}
