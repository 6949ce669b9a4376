//! Configuration schema definitions

use serde::{Deserialize, Serialize};

/// Top-level keys recognised in `.safetravel.toml`
pub const KNOWN_SECTIONS: &[&str] = &["general", "resolve", "logging"];

/// Root configuration schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConfigSchema {
    /// `[general]`
    #[serde(default)]
    pub general: GeneralConfig,

    /// `[resolve]`
    #[serde(default)]
    pub resolve: ResolveConfig,

    /// `[logging]`
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// General project configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default build-variant declarations file
    #[serde(default = "default_declarations")]
    pub declarations: String,

    /// Android project directory (where `local.properties` lives)
    #[serde(default = "default_project_dir")]
    pub project_dir: String,

    /// App identifier used when declarations omit both `namespace` and
    /// `applicationId`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            declarations: default_declarations(),
            project_dir: default_project_dir(),
            application_id: None,
        }
    }
}

fn default_declarations() -> String {
    "android/variants.toml".to_string()
}

fn default_project_dir() -> String {
    "android".to_string()
}

/// How a known-incompatible desugaring runtime is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesugaringPolicy {
    /// Abort resolution
    #[default]
    Error,
    /// Report a warning and continue
    Warn,
}

/// Resolver policy configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveConfig {
    /// Inject a default multidex pin when multidex is enabled without one
    #[serde(default = "default_true")]
    pub inject_multidex: bool,

    /// Treatment of incompatible desugaring runtimes
    #[serde(default)]
    pub desugaring_policy: DesugaringPolicy,

    /// Fail the command when resolution produced warnings
    #[serde(default)]
    pub warnings_as_errors: bool,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            inject_multidex: true,
            desugaring_policy: DesugaringPolicy::default(),
            warnings_as_errors: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter used when `RUST_LOG` is unset
    #[serde(default = "default_level")]
    pub level: String,

    /// Emit JSON log lines
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
