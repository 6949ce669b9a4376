//! Signing configurations and build-variant binding

use crate::declarations::{SigningConfigDeclaration, VariantDeclaration};
use crate::error::{ResolveError, Result};
use safetravel_core::validation::{ValidationIssue, ValidationResult};
use serde::Serialize;
use std::collections::BTreeMap;

/// Signing identity the Android Gradle plugin always defines.
pub const DEBUG_IDENTITY: &str = "debug";

/// Variant that ships to the store.
pub const RELEASE_VARIANT: &str = "release";

/// A named key/certificate configuration.
///
/// Passwords are never stored, only the environment variable names the
/// external build reads them from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningConfig {
    /// Keystore path as declared
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_file: Option<String>,
    /// Key alias inside the keystore
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_alias: Option<String>,
    /// Environment variable holding the store password
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_password_env: Option<String>,
    /// Environment variable holding the key password
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_password_env: Option<String>,
}

impl SigningConfig {
    /// The implicit debug keystore
    pub fn debug() -> Self {
        Self {
            store_file: Some("~/.android/debug.keystore".to_string()),
            key_alias: Some("androiddebugkey".to_string()),
            store_password_env: None,
            key_password_env: None,
        }
    }

    /// Store file with a leading `~` expanded to the home directory
    pub fn expanded_store_file(&self) -> Option<String> {
        self.store_file
            .as_deref()
            .map(|path| shellexpand::tilde(path).into_owned())
    }
}

impl From<&SigningConfigDeclaration> for SigningConfig {
    fn from(decl: &SigningConfigDeclaration) -> Self {
        Self {
            store_file: decl.store_file.clone(),
            key_alias: decl.key_alias.clone(),
            store_password_env: decl.store_password_env.clone(),
            key_password_env: decl.key_password_env.clone(),
        }
    }
}

/// A build variant with its signing identity bound
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedVariant {
    /// Variant name
    pub name: String,
    /// Bound signing configuration; `None` builds unsigned
    pub signing_identity: Option<String>,
    /// Shrink and obfuscate code
    pub minify_enabled: bool,
    /// Build a debuggable APK
    pub debuggable: bool,
}

/// Declared signing configurations plus the implicit `debug` one.
pub fn signing_configs(
    declared: &BTreeMap<String, SigningConfigDeclaration>,
) -> BTreeMap<String, SigningConfig> {
    let mut configs: BTreeMap<String, SigningConfig> = declared
        .iter()
        .map(|(name, decl)| (name.clone(), SigningConfig::from(decl)))
        .collect();
    configs
        .entry(DEBUG_IDENTITY.to_string())
        .or_insert_with(SigningConfig::debug);
    configs
}

/// The variants the Android Gradle plugin creates when none are declared.
fn default_variants() -> BTreeMap<String, ResolvedVariant> {
    [
        ResolvedVariant {
            name: DEBUG_IDENTITY.to_string(),
            signing_identity: Some(DEBUG_IDENTITY.to_string()),
            minify_enabled: false,
            debuggable: true,
        },
        ResolvedVariant {
            name: RELEASE_VARIANT.to_string(),
            signing_identity: None,
            minify_enabled: false,
            debuggable: false,
        },
    ]
    .into_iter()
    .map(|v| (v.name.clone(), v))
    .collect()
}

/// Resolve each variant's signing identity against the declared configs.
///
/// # Errors
///
/// `UnknownSigningIdentity` for the first variant (by name) whose identity
/// is not declared.
pub fn bind_variants(
    declared: &BTreeMap<String, VariantDeclaration>,
    configs: &BTreeMap<String, SigningConfig>,
    warnings: &mut ValidationResult,
) -> Result<BTreeMap<String, ResolvedVariant>> {
    if declared.is_empty() {
        return Ok(default_variants());
    }

    let mut variants = BTreeMap::new();
    for (name, decl) in declared {
        if let Some(identity) = &decl.signing_identity {
            if !configs.contains_key(identity) {
                return Err(ResolveError::UnknownSigningIdentity {
                    variant: name.clone(),
                    identity: identity.clone(),
                    declared: configs.keys().cloned().collect::<Vec<_>>().join(", "),
                });
            }
        }

        let debuggable = decl.debuggable.unwrap_or(name == DEBUG_IDENTITY);
        let variant = ResolvedVariant {
            name: name.clone(),
            signing_identity: decl.signing_identity.clone(),
            minify_enabled: decl.minify_enabled.unwrap_or(false),
            debuggable,
        };

        let field = format!("buildVariants.{name}.signingIdentity");
        match variant.signing_identity.as_deref() {
            Some(DEBUG_IDENTITY) if name == RELEASE_VARIANT => {
                warnings.add_warning(ValidationIssue::new(
                    field,
                    "DEBUG_SIGNED_RELEASE",
                    "release artifacts are signed with the debug key and cannot be published",
                ));
            }
            None if !debuggable => {
                warnings.add_warning(ValidationIssue::new(
                    field,
                    "UNSIGNED_VARIANT",
                    format!("variant '{name}' has no signing identity; its artifact will be unsigned"),
                ));
            }
            _ => {}
        }

        variants.insert(name.clone(), variant);
    }

    Ok(variants)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(identity: Option<&str>) -> VariantDeclaration {
        VariantDeclaration {
            signing_identity: identity.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_debug_is_implicit() {
        let configs = signing_configs(&BTreeMap::new());
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[DEBUG_IDENTITY], SigningConfig::debug());
    }

    #[test]
    fn test_declared_debug_overrides_implicit() {
        let mut declared = BTreeMap::new();
        declared.insert(
            DEBUG_IDENTITY.to_string(),
            SigningConfigDeclaration {
                store_file: Some("keys/debug.jks".to_string()),
                ..Default::default()
            },
        );
        let configs = signing_configs(&declared);
        assert_eq!(configs[DEBUG_IDENTITY].store_file.as_deref(), Some("keys/debug.jks"));
    }

    #[test]
    fn test_default_variants_when_none_declared() {
        let mut warnings = ValidationResult::new();
        let variants =
            bind_variants(&BTreeMap::new(), &signing_configs(&BTreeMap::new()), &mut warnings)
                .unwrap();
        assert_eq!(variants.len(), 2);
        assert!(variants["debug"].debuggable);
        assert!(variants["release"].signing_identity.is_none());
        assert!(warnings.warnings().is_empty());
    }

    #[test]
    fn test_release_signed_with_debug_warns() {
        let mut declared = BTreeMap::new();
        declared.insert(RELEASE_VARIANT.to_string(), variant(Some("debug")));
        let mut warnings = ValidationResult::new();

        let variants =
            bind_variants(&declared, &signing_configs(&BTreeMap::new()), &mut warnings).unwrap();

        assert_eq!(variants["release"].signing_identity.as_deref(), Some("debug"));
        assert!(!variants["release"].debuggable);
        assert_eq!(warnings.warnings()[0].code, "DEBUG_SIGNED_RELEASE");
    }

    #[test]
    fn test_unknown_identity() {
        let mut declared = BTreeMap::new();
        declared.insert(RELEASE_VARIANT.to_string(), variant(Some("upload")));
        let err = bind_variants(
            &declared,
            &signing_configs(&BTreeMap::new()),
            &mut ValidationResult::new(),
        )
        .unwrap_err();

        assert_eq!(
            err,
            ResolveError::UnknownSigningIdentity {
                variant: "release".to_string(),
                identity: "upload".to_string(),
                declared: "debug".to_string(),
            }
        );
    }

    #[test]
    fn test_unsigned_declared_variant_warns() {
        let mut declared = BTreeMap::new();
        declared.insert("staging".to_string(), variant(None));
        let mut warnings = ValidationResult::new();
        bind_variants(&declared, &signing_configs(&BTreeMap::new()), &mut warnings).unwrap();
        assert_eq!(warnings.warnings()[0].code, "UNSIGNED_VARIANT");
    }

    #[test]
    fn test_expanded_store_file_keeps_relative_paths() {
        let config = SigningConfig {
            store_file: Some("keys/upload.jks".to_string()),
            ..Default::default()
        };
        assert_eq!(config.expanded_store_file().as_deref(), Some("keys/upload.jks"));
    }
}
