//! Raw build-variant declarations
//!
//! Declarations mirror the options of an Android `build.gradle.kts`, with
//! every option optional. They are read from TOML or JSON; keys the
//! resolver does not know are kept so they can be reported as warnings.

use safetravel_core::error::{Error, Result, ResultExt};
use safetravel_core::validation::{validate_known_keys, ValidationResult};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Recognised top-level keys
pub const KNOWN_KEYS: &[&str] = &[
    "schemaVersion",
    "namespace",
    "applicationId",
    "compileSdkVersion",
    "targetSdkVersion",
    "minSdkVersion",
    "ndkVersion",
    "versionCode",
    "versionName",
    "sourceLanguageLevel",
    "targetLanguageLevel",
    "kotlinJvmTarget",
    "multiDexEnabled",
    "coreLibraryDesugaringEnabled",
    "dependencyPins",
    "signingConfigs",
    "buildVariants",
];

const VARIANT_KEYS: &[&str] = &["signingIdentity", "minifyEnabled", "debuggable"];

const SIGNING_KEYS: &[&str] = &["storeFile", "keyAlias", "storePasswordEnv", "keyPasswordEnv"];

/// Top-level declarations
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Declarations {
    /// Declarations format version (defaults to 1)
    pub schema_version: Option<u32>,
    /// Code namespace (R class package)
    pub namespace: Option<String>,
    /// Store identifier
    pub application_id: Option<String>,
    /// `compileSdkVersion`
    pub compile_sdk_version: Option<u32>,
    /// `targetSdkVersion`
    pub target_sdk_version: Option<u32>,
    /// `minSdkVersion`
    pub min_sdk_version: Option<u32>,
    /// NDK release, e.g. `23.1.7779620`
    pub ndk_version: Option<String>,
    /// Raw `versionCode`, signed so out-of-range input reaches the resolver
    pub version_code: Option<i64>,
    /// User-visible version
    pub version_name: Option<String>,
    /// Java source compatibility, as written (`"17"`, `1.8`, ...)
    #[serde(default, deserialize_with = "version_tag")]
    pub source_language_level: Option<String>,
    /// Java target compatibility, as written
    #[serde(default, deserialize_with = "version_tag")]
    pub target_language_level: Option<String>,
    /// Kotlin `jvmTarget`; follows the target level when absent
    #[serde(default, deserialize_with = "version_tag")]
    pub kotlin_jvm_target: Option<String>,
    /// Whether the app is packaged as multiple dex files
    pub multi_dex_enabled: Option<bool>,
    /// Whether Java library desugaring is on
    pub core_library_desugaring_enabled: Option<bool>,
    /// `(key, version)` in declaration order; duplicates are kept for the resolver to reject
    #[serde(default, deserialize_with = "pin_entries")]
    pub dependency_pins: Vec<(String, String)>,
    /// Named signing configurations
    #[serde(default)]
    pub signing_configs: BTreeMap<String, SigningConfigDeclaration>,
    /// Build variants by name
    #[serde(default)]
    pub build_variants: BTreeMap<String, VariantDeclaration>,
    /// Unrecognised keys
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_json::Value>,
}

/// One entry of `buildVariants`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantDeclaration {
    /// Name of the signing configuration to bind
    pub signing_identity: Option<String>,
    /// Shrink and obfuscate code
    pub minify_enabled: Option<bool>,
    /// Build a debuggable APK
    pub debuggable: Option<bool>,
    /// Unrecognised keys
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_json::Value>,
}

/// One entry of `signingConfigs`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningConfigDeclaration {
    /// Keystore path; may start with `~`
    pub store_file: Option<String>,
    /// Key alias inside the keystore
    pub key_alias: Option<String>,
    /// Environment variable holding the store password
    pub store_password_env: Option<String>,
    /// Environment variable holding the key password
    pub key_password_env: Option<String>,
    /// Unrecognised keys
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_json::Value>,
}

impl Declarations {
    /// Load declarations, choosing the format by file extension
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::file_not_found(path));
        }
        let content = std::fs::read_to_string(path)?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let parsed = if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        };
        parsed.context(format!("Failed to parse declarations {}", path.display()))
    }

    /// Parse TOML declarations
    ///
    /// # Errors
    ///
    /// Fails on malformed TOML or mistyped values.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Parse JSON declarations
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON or mistyped values.
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// `UNKNOWN_KEY` warnings for every unrecognised key, nested ones included
    pub fn unknown_key_warnings(&self) -> ValidationResult {
        let mut result = validate_known_keys(self.unknown.keys(), KNOWN_KEYS, None);

        for (name, variant) in &self.build_variants {
            let prefix = format!("buildVariants.{name}");
            result.merge(validate_known_keys(variant.unknown.keys(), VARIANT_KEYS, Some(&prefix)));
        }
        for (name, config) in &self.signing_configs {
            let prefix = format!("signingConfigs.{name}");
            result.merge(validate_known_keys(config.unknown.keys(), SIGNING_KEYS, Some(&prefix)));
        }

        result
    }
}

/// A version tag written as a string or a bare number (`17`, `1.8`)
#[derive(Deserialize)]
#[serde(untagged)]
enum Tag {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl Tag {
    fn into_string(self) -> String {
        match self {
            Tag::Text(s) => s,
            Tag::Integer(i) => i.to_string(),
            Tag::Float(f) => f.to_string(),
        }
    }
}

fn version_tag<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Tag>::deserialize(deserializer)?.map(Tag::into_string))
}

fn pin_entries<'de, D>(deserializer: D) -> std::result::Result<Vec<(String, String)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct PinVisitor;

    impl<'de> Visitor<'de> for PinVisitor {
        type Value = Vec<(String, String)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a table of dependency coordinates to versions")
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut pins = Vec::new();
            while let Some((key, version)) = map.next_entry::<String, Tag>()? {
                pins.push((key, version.into_string()));
            }
            Ok(pins)
        }
    }

    deserializer.deserialize_map(PinVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use safetravel_core::error::ErrorCode;

    const GRADLE_EQUIVALENT: &str = r#"
        namespace = "tech.safetravel.smarttourist.smart_tourist_app"
        applicationId = "tech.safetravel.smarttourist.smart_tourist_app"
        compileSdkVersion = 34
        targetSdkVersion = 34
        sourceLanguageLevel = "VERSION_17"
        targetLanguageLevel = 17
        kotlinJvmTarget = "17"
        multiDexEnabled = true
        coreLibraryDesugaringEnabled = true

        [dependencyPins]
        "com.android.tools:desugar_jdk_libs" = "2.0.4"
        "com.google.firebase:firebase-bom" = "33.1.2"
        "androidx.multidex:multidex" = "2.0.1"

        [buildVariants.release]
        signingIdentity = "debug"
    "#;

    #[test]
    fn test_parse_toml() {
        let decl = Declarations::from_toml_str(GRADLE_EQUIVALENT).unwrap();

        assert_eq!(decl.compile_sdk_version, Some(34));
        assert_eq!(decl.min_sdk_version, None);
        assert_eq!(decl.source_language_level.as_deref(), Some("VERSION_17"));
        assert_eq!(decl.target_language_level.as_deref(), Some("17"));
        assert_eq!(decl.multi_dex_enabled, Some(true));
        assert_eq!(decl.dependency_pins.len(), 3);
        assert_eq!(
            decl.build_variants["release"].signing_identity.as_deref(),
            Some("debug")
        );
        assert!(decl.unknown.is_empty());
        assert!(decl.unknown_key_warnings().warnings().is_empty());
    }

    #[test]
    fn test_parse_json_keeps_duplicate_pin_keys() {
        let decl = Declarations::from_json_str(
            r#"{ "dependencyPins": { "multidex": "2.0.1", "multidex": "2.0.0" } }"#,
        )
        .unwrap();
        assert_eq!(
            decl.dependency_pins,
            vec![
                ("multidex".to_string(), "2.0.1".to_string()),
                ("multidex".to_string(), "2.0.0".to_string()),
            ]
        );
    }

    #[test]
    fn test_float_language_level() {
        let decl = Declarations::from_json_str(r#"{ "targetLanguageLevel": 1.8 }"#).unwrap();
        assert_eq!(decl.target_language_level.as_deref(), Some("1.8"));
    }

    #[test]
    fn test_unknown_keys_are_collected() {
        let decl = Declarations::from_toml_str(
            r#"
            compileSdkVersion = 34
            lintOptions = { abortOnError = false }

            [buildVariants.release]
            signingIdentity = "debug"
            shrinkResources = true

            [signingConfigs.upload]
            storeFile = "upload.jks"
            storeType = "pkcs12"
            "#,
        )
        .unwrap();

        let warnings = decl.unknown_key_warnings();
        let fields: Vec<&str> = warnings.warnings().iter().map(|w| w.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "lintOptions",
                "buildVariants.release.shrinkResources",
                "signingConfigs.upload.storeType",
            ]
        );
        assert!(warnings.is_valid());
    }

    #[test]
    fn test_mistyped_value_is_parse_error() {
        let err = Declarations::from_toml_str("compileSdkVersion = \"thirty-four\"").unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigParseError);
    }

    #[test]
    fn test_from_path_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let json = dir.path().join("variants.json");
        std::fs::write(&json, r#"{ "compileSdkVersion": 33 }"#).unwrap();
        assert_eq!(
            Declarations::from_path(&json).unwrap().compile_sdk_version,
            Some(33)
        );

        let toml_path = dir.path().join("variants.toml");
        std::fs::write(&toml_path, "compileSdkVersion = 34\n").unwrap();
        assert_eq!(
            Declarations::from_path(&toml_path).unwrap().compile_sdk_version,
            Some(34)
        );
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = Declarations::from_path(Path::new("/nonexistent/variants.toml")).unwrap_err();
        assert_eq!(err.code, ErrorCode::FileNotFound);
    }
}
