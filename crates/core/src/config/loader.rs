//! Configuration file loading

use super::schema::{ConfigSchema, KNOWN_SECTIONS};
use crate::error::{Error, Result, ResultExt};
use crate::validation::{validate_known_keys, ValidationIssue};
use std::path::{Path, PathBuf};

/// Name of the project-local configuration file
pub const CONFIG_FILE_NAME: &str = ".safetravel.toml";

/// Configuration wrapper
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed settings
    pub schema: ConfigSchema,
    /// File the settings came from, if any
    pub path: Option<PathBuf>,
    /// Non-fatal findings (unknown keys)
    pub warnings: Vec<ValidationIssue>,
}

impl Config {
    /// Load configuration from a file path or use defaults
    ///
    /// An explicit path must exist. Without one, the standard locations are
    /// searched and defaults are used when nothing is found.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) if !p.exists() => return Err(Error::config_not_found(p)),
            Some(p) => Some(p.to_path_buf()),
            None => find_config_file(),
        };

        match config_path {
            Some(p) => {
                let content = std::fs::read_to_string(&p)
                    .map_err(Error::from)
                    .context(format!("Failed to read config file {}", p.display()))?;
                let mut config = Self::from_toml_str(&content)
                    .context(format!("Failed to parse config file {}", p.display()))?;
                config.path = Some(p);
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Fails on malformed TOML or mistyped values.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(content)?;
        let warnings = validate_known_keys(table.keys(), KNOWN_SECTIONS, None).into_warnings();
        let schema: ConfigSchema = toml::from_str(content)?;

        Ok(Self {
            schema,
            path: None,
            warnings,
        })
    }
}

/// Find configuration file in standard locations
fn find_config_file() -> Option<PathBuf> {
    let mut candidates = vec![
        PathBuf::from(CONFIG_FILE_NAME),
        PathBuf::from("safetravel.toml"),
    ];
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("safetravel").join("config.toml"));
    }

    candidates.into_iter().find(|candidate| candidate.exists())
}
