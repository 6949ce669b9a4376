//! Toolchain-supplied defaults
//!
//! The Flutter Gradle plugin supplies `minSdk`, `versionCode`,
//! `versionName` and friends when a project does not declare them. Those
//! values are modelled as an injected [`DefaultProvider`] so the resolver
//! never reaches into process-wide state.

use crate::language::LanguageLevel;
use safetravel_core::error::{Error, ErrorCode, Result};
use std::path::Path;

/// Compile SDK the Flutter plugin applies.
pub const FLUTTER_COMPILE_SDK: u32 = 34;
/// Target SDK the Flutter plugin applies.
pub const FLUTTER_TARGET_SDK: u32 = 34;
/// Minimum SDK the Flutter plugin applies.
pub const FLUTTER_MIN_SDK: u32 = 21;
/// NDK the Flutter plugin pins.
pub const FLUTTER_NDK_VERSION: &str = "23.1.7779620";
/// Version code used when `local.properties` has none.
pub const FLUTTER_VERSION_CODE: u32 = 1;
/// Version name used when `local.properties` has none.
pub const FLUTTER_VERSION_NAME: &str = "1.0";

/// Source of default values for omitted declarations.
pub trait DefaultProvider {
    /// Name shown in diagnostics
    fn name(&self) -> &str;
    /// Default `applicationId` (and `namespace`)
    fn application_id(&self) -> Option<String> {
        None
    }
    /// Default `compileSdkVersion`
    fn compile_sdk_version(&self) -> Option<u32>;
    /// Default `targetSdkVersion`
    fn target_sdk_version(&self) -> Option<u32>;
    /// Default `minSdkVersion`
    fn min_sdk_version(&self) -> Option<u32>;
    /// Default `ndkVersion`
    fn ndk_version(&self) -> Option<String>;
    /// Default `versionCode`
    fn version_code(&self) -> Option<u32>;
    /// Default `versionName`
    fn version_name(&self) -> Option<String>;
    /// Default source/target language level
    fn language_level(&self) -> Option<LanguageLevel>;
}

/// Defaults of the Flutter Gradle plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlutterDefaults {
    application_id: Option<String>,
    version_code: u32,
    version_name: String,
}

impl Default for FlutterDefaults {
    fn default() -> Self {
        Self::new()
    }
}

impl FlutterDefaults {
    /// Defaults with the plugin's fallback version
    pub fn new() -> Self {
        Self {
            application_id: None,
            version_code: FLUTTER_VERSION_CODE,
            version_name: FLUTTER_VERSION_NAME.to_string(),
        }
    }

    /// Defaults with an explicit app version
    pub fn with_version(version_code: u32, version_name: impl Into<String>) -> Self {
        Self {
            application_id: None,
            version_code,
            version_name: version_name.into(),
        }
    }

    /// Supply the app identifier used when declarations name neither
    /// `namespace` nor `applicationId`
    #[must_use]
    pub fn with_application_id(mut self, application_id: impl Into<String>) -> Self {
        self.application_id = Some(application_id.into());
        self
    }

    /// Read `flutter.versionCode` / `flutter.versionName` from `local.properties`.
    ///
    /// A missing file yields the plugin's fallback version.
    ///
    /// # Errors
    ///
    /// Fails when the file exists but cannot be read, or holds a
    /// non-numeric version code.
    pub fn from_local_properties(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse_properties(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No local.properties; using plugin fallback version");
                Ok(Self::new())
            }
            Err(e) => Err(Error::from(e)),
        }
    }

    /// Parse Java properties text.
    ///
    /// # Errors
    ///
    /// Fails on a non-numeric `flutter.versionCode`.
    pub fn parse_properties(content: &str) -> Result<Self> {
        let mut defaults = Self::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let Some((key, value)) = line.split_once(['=', ':']) else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "flutter.versionCode" => {
                    defaults.version_code = value.parse().map_err(|_| {
                        Error::new(
                            ErrorCode::InvalidConfigValue,
                            format!("flutter.versionCode '{value}' is not a number"),
                        )
                        .with_context("While reading local.properties")
                    })?;
                }
                "flutter.versionName" => defaults.version_name = value.to_string(),
                _ => {}
            }
        }

        Ok(defaults)
    }
}

impl DefaultProvider for FlutterDefaults {
    fn name(&self) -> &str {
        "flutter"
    }

    fn application_id(&self) -> Option<String> {
        self.application_id.clone()
    }

    fn compile_sdk_version(&self) -> Option<u32> {
        Some(FLUTTER_COMPILE_SDK)
    }

    fn target_sdk_version(&self) -> Option<u32> {
        Some(FLUTTER_TARGET_SDK)
    }

    fn min_sdk_version(&self) -> Option<u32> {
        Some(FLUTTER_MIN_SDK)
    }

    fn ndk_version(&self) -> Option<String> {
        Some(FLUTTER_NDK_VERSION.to_string())
    }

    fn version_code(&self) -> Option<u32> {
        Some(self.version_code)
    }

    fn version_name(&self) -> Option<String> {
        Some(self.version_name.clone())
    }

    fn language_level(&self) -> Option<LanguageLevel> {
        Some(LanguageLevel::Java17)
    }
}

/// Explicit defaults, for embedding and tests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct StaticDefaults {
    pub application_id: Option<String>,
    pub compile_sdk_version: Option<u32>,
    pub target_sdk_version: Option<u32>,
    pub min_sdk_version: Option<u32>,
    pub ndk_version: Option<String>,
    pub version_code: Option<u32>,
    pub version_name: Option<String>,
    pub language_level: Option<LanguageLevel>,
}

impl StaticDefaults {
    /// A provider that supplies nothing
    pub fn empty() -> Self {
        Self::default()
    }
}

impl DefaultProvider for StaticDefaults {
    fn name(&self) -> &str {
        "static"
    }

    fn application_id(&self) -> Option<String> {
        self.application_id.clone()
    }

    fn compile_sdk_version(&self) -> Option<u32> {
        self.compile_sdk_version
    }

    fn target_sdk_version(&self) -> Option<u32> {
        self.target_sdk_version
    }

    fn min_sdk_version(&self) -> Option<u32> {
        self.min_sdk_version
    }

    fn ndk_version(&self) -> Option<String> {
        self.ndk_version.clone()
    }

    fn version_code(&self) -> Option<u32> {
        self.version_code
    }

    fn version_name(&self) -> Option<String> {
        self.version_name.clone()
    }

    fn language_level(&self) -> Option<LanguageLevel> {
        self.language_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flutter_defaults_are_ordered() {
        let defaults = FlutterDefaults::new();
        let min = defaults.min_sdk_version().unwrap();
        let target = defaults.target_sdk_version().unwrap();
        let compile = defaults.compile_sdk_version().unwrap();
        assert!(min <= target && target <= compile);
        assert_eq!(defaults.version_code(), Some(1));
        assert_eq!(defaults.version_name().as_deref(), Some("1.0"));
    }

    #[test]
    fn test_parse_properties() {
        let defaults = FlutterDefaults::parse_properties(
            "# generated by flutter\nsdk.dir=/opt/android\nflutter.versionName=2.3.1\nflutter.versionCode = 42\n",
        )
        .unwrap();
        assert_eq!(defaults, FlutterDefaults::with_version(42, "2.3.1"));
    }

    #[test]
    fn test_parse_properties_bad_version_code() {
        let err = FlutterDefaults::parse_properties("flutter.versionCode=abc").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidConfigValue);
    }

    #[test]
    fn test_missing_local_properties_uses_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let defaults = FlutterDefaults::from_local_properties(&dir.path().join("local.properties")).unwrap();
        assert_eq!(defaults, FlutterDefaults::new());
    }

    #[test]
    fn test_local_properties_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.properties");
        std::fs::write(&path, "flutter.versionCode=7\n").unwrap();
        let defaults = FlutterDefaults::from_local_properties(&path).unwrap();
        assert_eq!(defaults.version_code(), Some(7));
        assert_eq!(defaults.version_name().as_deref(), Some(FLUTTER_VERSION_NAME));
    }

    #[test]
    fn test_static_empty_supplies_nothing() {
        let defaults = StaticDefaults::empty();
        assert_eq!(defaults.compile_sdk_version(), None);
        assert_eq!(defaults.language_level(), None);
        assert_eq!(defaults.application_id(), None);
    }

    #[test]
    fn test_flutter_application_id_is_opt_in() {
        assert_eq!(FlutterDefaults::new().application_id(), None);

        let defaults = FlutterDefaults::with_version(4, "1.1.0").with_application_id("tech.safetravel.app");
        assert_eq!(defaults.application_id().as_deref(), Some("tech.safetravel.app"));
        assert_eq!(defaults.version_code(), Some(4));
    }
}
