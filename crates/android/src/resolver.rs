//! Build Variant Resolver
//!
//! Turns [`Declarations`] into a [`BuildVariantConfig`]:
//!
//! 1. schema version and unknown-key warnings
//! 2. identifiers and defaults from the injected [`DefaultProvider`]
//! 3. `minSdk <= targetSdk <= compileSdk`
//! 4. language levels
//! 5. dependency pins, multidex and desugaring requirements
//! 6. signing identities per variant
//!
//! The first violated invariant aborts resolution. Resolution is a pure
//! function of its inputs: no filesystem, network or environment access.

use crate::declarations::Declarations;
use crate::defaults::DefaultProvider;
use crate::dependency;
use crate::error::{ResolveError, Result};
use crate::language;
use crate::model::{BuildVariantConfig, Resolution, CURRENT_SCHEMA_VERSION};
use crate::sdk::SdkLevels;
use crate::signing;
use once_cell::sync::Lazy;
use regex::Regex;
use safetravel_core::config::{DesugaringPolicy, ResolveConfig};
use safetravel_core::validation::{ValidationResult, Validator};
use std::fmt;

/// Largest `versionCode` Google Play accepts.
pub const MAX_VERSION_CODE: u32 = 2_100_000_000;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*(\.[A-Za-z][A-Za-z0-9_]*)+$").unwrap());

/// Resolver policy knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Pin multidex automatically instead of failing when it is missing
    pub inject_multidex: bool,
    /// Treatment of known-incompatible desugaring runtimes
    pub desugaring_policy: DesugaringPolicy,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            inject_multidex: true,
            desugaring_policy: DesugaringPolicy::Error,
        }
    }
}

impl From<&ResolveConfig> for ResolveOptions {
    fn from(config: &ResolveConfig) -> Self {
        Self {
            inject_multidex: config.inject_multidex,
            desugaring_policy: config.desugaring_policy,
        }
    }
}

/// Resolve declarations into a validated build descriptor.
///
/// # Errors
///
/// Returns the first violated invariant; see [`ResolveError`].
pub fn resolve(
    declarations: &Declarations,
    defaults: &dyn DefaultProvider,
    options: &ResolveOptions,
) -> Result<Resolution> {
    let mut warnings = ValidationResult::new();

    let schema_version = declarations.schema_version.unwrap_or(CURRENT_SCHEMA_VERSION);
    if schema_version == 0 || schema_version > CURRENT_SCHEMA_VERSION {
        return Err(ResolveError::UnsupportedSchemaVersion {
            found: schema_version,
            supported: CURRENT_SCHEMA_VERSION,
        });
    }
    warnings.merge(declarations.unknown_key_warnings());

    let (namespace, application_id) = resolve_identifiers(declarations, defaults, &mut warnings)?;

    let provider = defaults.name();
    let compile = declared_or_default(
        "compileSdkVersion",
        declarations.compile_sdk_version,
        provider,
        || defaults.compile_sdk_version(),
    )?;
    let target = declared_or_default(
        "targetSdkVersion",
        declarations.target_sdk_version,
        provider,
        || defaults.target_sdk_version(),
    )?;
    let min = declared_or_default(
        "minSdkVersion",
        declarations.min_sdk_version,
        provider,
        || defaults.min_sdk_version(),
    )?;
    let version_code = resolve_version_code(declarations.version_code, defaults)?;
    let version_name = declared_or_default(
        "versionName",
        declarations.version_name.clone(),
        provider,
        || defaults.version_name(),
    )?;
    let ndk_version = declarations.ndk_version.clone().or_else(|| defaults.ndk_version());

    let sdk = SdkLevels::new(compile, target, min)?;

    let default_level = defaults.language_level().map(|level| level.as_str().to_string());
    let source = declarations
        .source_language_level
        .clone()
        .or_else(|| declarations.target_language_level.clone());
    let target_level = declarations
        .target_language_level
        .clone()
        .or_else(|| declarations.source_language_level.clone());
    let source = declared_or_default("sourceLanguageLevel", source, provider, || default_level.clone())?;
    let target_level =
        declared_or_default("targetLanguageLevel", target_level, provider, || default_level.clone())?;
    let jvm_target = declarations
        .kotlin_jvm_target
        .clone()
        .unwrap_or_else(|| target_level.clone());
    let levels = language::resolve_levels(&source, &target_level, &jvm_target)?;

    let multi_dex_enabled = declarations.multi_dex_enabled.unwrap_or(false);
    let desugaring_enabled = declarations.core_library_desugaring_enabled.unwrap_or(false);

    let mut pins = dependency::canonicalize_pins(&declarations.dependency_pins)?;
    dependency::ensure_multidex(&mut pins, multi_dex_enabled, options.inject_multidex, &mut warnings)?;
    dependency::check_desugaring(
        &pins,
        desugaring_enabled,
        sdk.compile,
        options.desugaring_policy,
        &mut warnings,
    )?;
    dependency::check_firebase(&pins, &sdk, &mut warnings);

    let signing_configs = signing::signing_configs(&declarations.signing_configs);
    let build_variants =
        signing::bind_variants(&declarations.build_variants, &signing_configs, &mut warnings)?;

    let warnings = warnings.into_warnings();
    for warning in &warnings {
        tracing::warn!(field = %warning.field, code = %warning.code, "{}", warning.message);
    }
    tracing::debug!(
        application_id = %application_id,
        variants = build_variants.len(),
        pins = pins.len(),
        "Resolved build descriptor"
    );

    Ok(Resolution {
        config: BuildVariantConfig {
            schema_version,
            namespace,
            application_id,
            sdk,
            ndk_version,
            version_code,
            version_name,
            source_language_level: levels.source,
            target_language_level: levels.target,
            kotlin_jvm_target: levels.kotlin_jvm_target,
            multi_dex_enabled,
            core_library_desugaring_enabled: desugaring_enabled,
            dependency_pins: pins,
            signing_configs,
            build_variants,
        },
        warnings,
    })
}

fn declared_or_default<T, F>(field: &str, declared: Option<T>, provider: &str, default: F) -> Result<T>
where
    T: fmt::Debug,
    F: FnOnce() -> Option<T>,
{
    if let Some(value) = declared {
        return Ok(value);
    }

    let value = default().ok_or_else(|| ResolveError::MissingRequiredField {
        field: field.to_string(),
        provider: provider.to_string(),
    })?;
    tracing::debug!(field, provider, value = ?value, "Applied default");
    Ok(value)
}

fn resolve_identifiers(
    declarations: &Declarations,
    defaults: &dyn DefaultProvider,
    warnings: &mut ValidationResult,
) -> Result<(String, String)> {
    let namespace = declarations
        .namespace
        .as_deref()
        .map(|value| check_identifier("namespace", value))
        .transpose()?;
    let application_id = declarations
        .application_id
        .as_deref()
        .map(|value| check_identifier("applicationId", value))
        .transpose()?;

    if let (Some(ns), Some(id)) = (&namespace, &application_id) {
        let message = format!("namespace '{ns}' differs from applicationId '{id}'");
        warnings.merge(
            Validator::new()
                .warn_if("namespace, applicationId", ns != id, "IDENTIFIER_DIVERGENCE", &message)
                .validate(),
        );
    }

    match (namespace, application_id) {
        (Some(ns), Some(id)) => Ok((ns, id)),
        (Some(value), None) | (None, Some(value)) => Ok((value.clone(), value)),
        (None, None) => {
            let provided = defaults.application_id().ok_or_else(|| ResolveError::MissingRequiredField {
                field: "namespace".to_string(),
                provider: defaults.name().to_string(),
            })?;
            let value = check_identifier("applicationId", &provided)?;
            tracing::debug!(provider = defaults.name(), value = %value, "Applied default identifier");
            Ok((value.clone(), value))
        }
    }
}

fn check_identifier(field: &str, value: &str) -> Result<String> {
    let result = Validator::new()
        .pattern(field, value, &IDENTIFIER, "a reverse-domain identifier")
        .validate();

    match result.errors().first() {
        Some(issue) => Err(ResolveError::InvalidIdentifier {
            field: issue.field.clone(),
            value: value.to_string(),
            expected: issue.expected.clone().unwrap_or_default(),
        }),
        None => Ok(value.to_string()),
    }
}

/// `versionCode` from the declarations or the provider, range-checked either way
fn resolve_version_code(declared: Option<i64>, defaults: &dyn DefaultProvider) -> Result<u32> {
    let raw = match declared {
        Some(raw) => raw,
        None => i64::from(declared_or_default("versionCode", None, defaults.name(), || {
            defaults.version_code()
        })?),
    };

    u32::try_from(raw)
        .ok()
        .filter(|code| (1..=MAX_VERSION_CODE).contains(code))
        .ok_or_else(|| ResolveError::InvalidVersionCode {
            value: raw,
            max: MAX_VERSION_CODE,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::{FlutterDefaults, StaticDefaults};
    use crate::dependency::Coordinate;
    use crate::language::LanguageLevel;
    use crate::declarations::VariantDeclaration;
    use proptest::prelude::*;

    const APP_ID: &str = "tech.safetravel.smarttourist.smart_tourist_app";

    fn flutter_like() -> StaticDefaults {
        StaticDefaults {
            application_id: Some(APP_ID.to_string()),
            compile_sdk_version: Some(34),
            target_sdk_version: Some(34),
            min_sdk_version: Some(21),
            ndk_version: None,
            version_code: Some(1),
            version_name: Some("1.0".to_string()),
            language_level: Some(LanguageLevel::Java17),
        }
    }

    fn pins(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn base() -> Declarations {
        Declarations {
            compile_sdk_version: Some(34),
            target_sdk_version: Some(34),
            min_sdk_version: Some(21),
            source_language_level: Some("17".to_string()),
            target_language_level: Some("17".to_string()),
            ..Default::default()
        }
    }

    fn resolve_default(decl: &Declarations) -> Result<Resolution> {
        resolve(decl, &flutter_like(), &ResolveOptions::default())
    }

    #[test]
    fn test_multidex_example_resolves_without_warnings() {
        let decl = Declarations {
            multi_dex_enabled: Some(true),
            dependency_pins: pins(&[("multidex", "2.0.1")]),
            ..base()
        };

        let resolution = resolve_default(&decl).unwrap();
        assert!(!resolution.has_warnings(), "{:?}", resolution.warnings);

        let config = &resolution.config;
        assert_eq!(config.sdk(), SdkLevels::new(34, 34, 21).unwrap());
        assert_eq!(config.source_language_level(), LanguageLevel::Java17);
        assert!(config.multi_dex_enabled());
        assert_eq!(config.dependency_pins()[&Coordinate::multidex()].version, "2.0.1");
        assert_eq!(config.namespace(), APP_ID);
        assert_eq!(config.application_id(), APP_ID);
    }

    #[test]
    fn test_min_above_target_fails() {
        let decl = Declarations {
            min_sdk_version: Some(35),
            ..base()
        };
        let err = resolve_default(&decl).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidSdkRange { .. }));
    }

    #[test]
    fn test_language_mismatch_fails() {
        let decl = Declarations {
            target_language_level: Some("1.8".to_string()),
            ..base()
        };
        let err = resolve_default(&decl).unwrap_err();
        assert!(matches!(err, ResolveError::UnsupportedLanguageLevel { .. }));
    }

    #[test]
    fn test_defaults_fill_omitted_fields() {
        let decl = Declarations {
            namespace: Some(APP_ID.to_string()),
            ..Default::default()
        };
        let resolution = resolve(&decl, &FlutterDefaults::with_version(12, "1.4.0"), &ResolveOptions::default())
            .unwrap();
        let config = resolution.config;

        assert_eq!(config.sdk().min, 21);
        assert_eq!(config.sdk().compile, 34);
        assert_eq!(config.version_code(), 12);
        assert_eq!(config.version_name(), "1.4.0");
        assert_eq!(config.ndk_version(), Some("23.1.7779620"));
        assert_eq!(config.kotlin_jvm_target(), LanguageLevel::Java17);
        assert_eq!(config.build_variants().len(), 2);
    }

    #[test]
    fn test_missing_field_without_default() {
        let decl = Declarations {
            namespace: Some(APP_ID.to_string()),
            compile_sdk_version: Some(34),
            ..Default::default()
        };
        let err = resolve(&decl, &StaticDefaults::empty(), &ResolveOptions::default()).unwrap_err();
        assert_eq!(
            err,
            ResolveError::MissingRequiredField {
                field: "targetSdkVersion".to_string(),
                provider: "static".to_string(),
            }
        );
    }

    #[test]
    fn test_single_language_level_applies_to_both() {
        let decl = Declarations {
            source_language_level: None,
            target_language_level: Some("11".to_string()),
            ..base()
        };
        let config = resolve_default(&decl).unwrap().config;
        assert_eq!(config.source_language_level(), LanguageLevel::Java11);
        assert_eq!(config.kotlin_jvm_target(), LanguageLevel::Java11);
    }

    #[test]
    fn test_identifier_divergence_warns() {
        let decl = Declarations {
            namespace: Some("tech.safetravel.app".to_string()),
            application_id: Some("tech.safetravel.app.dev".to_string()),
            ..base()
        };
        let resolution = resolve_default(&decl).unwrap();
        assert_eq!(resolution.warnings[0].code, "IDENTIFIER_DIVERGENCE");
        assert_eq!(resolution.config.namespace(), "tech.safetravel.app");
        assert_eq!(resolution.config.application_id(), "tech.safetravel.app.dev");
    }

    #[test]
    fn test_invalid_identifier() {
        let decl = Declarations {
            application_id: Some("smart tourist".to_string()),
            ..base()
        };
        let err = resolve_default(&decl).unwrap_err();
        assert_eq!(err.field(), "applicationId");
    }

    #[test]
    fn test_invalid_declared_application_id_names_its_field() {
        let decl = Declarations {
            namespace: Some(APP_ID.to_string()),
            application_id: Some("smart tourist".to_string()),
            ..base()
        };
        let err = resolve_default(&decl).unwrap_err();
        assert_eq!(
            err,
            ResolveError::InvalidIdentifier {
                field: "applicationId".to_string(),
                value: "smart tourist".to_string(),
                expected: "a reverse-domain identifier".to_string(),
            }
        );

        let decl = Declarations {
            namespace: Some("smart tourist".to_string()),
            application_id: Some(APP_ID.to_string()),
            ..base()
        };
        assert_eq!(resolve_default(&decl).unwrap_err().field(), "namespace");
    }

    #[test]
    fn test_matching_identifiers_do_not_warn() {
        let decl = Declarations {
            namespace: Some(APP_ID.to_string()),
            application_id: Some(APP_ID.to_string()),
            ..base()
        };
        assert!(!resolve_default(&decl).unwrap().has_warnings());
    }

    #[test]
    fn test_identifier_from_provider() {
        let config = resolve_default(&base()).unwrap().config;
        assert_eq!(config.namespace(), APP_ID);
        assert_eq!(config.application_id(), APP_ID);

        let err = resolve(&base(), &FlutterDefaults::new(), &ResolveOptions::default()).unwrap_err();
        assert_eq!(
            err,
            ResolveError::MissingRequiredField {
                field: "namespace".to_string(),
                provider: "flutter".to_string(),
            }
        );
    }

    #[test]
    fn test_app_declarations_resolve_with_flutter_defaults() {
        let decl = Declarations::from_toml_str(
            r#"
            compileSdkVersion = 34
            targetSdkVersion = 34
            minSdkVersion = 21
            sourceLanguageLevel = "17"
            targetLanguageLevel = "17"
            multiDexEnabled = true

            [dependencyPins]
            multidex = "2.0.1"
            "#,
        )
        .unwrap();
        let defaults = FlutterDefaults::new().with_application_id(APP_ID);

        let resolution = resolve(&decl, &defaults, &ResolveOptions::default()).unwrap();
        assert!(!resolution.has_warnings(), "{:?}", resolution.warnings);
        assert_eq!(resolution.config.application_id(), APP_ID);
        assert_eq!(resolution.config.sdk(), SdkLevels::new(34, 34, 21).unwrap());
    }

    #[test]
    fn test_version_code_bounds() {
        for bad in [0, -3, i64::from(MAX_VERSION_CODE) + 1] {
            let decl = Declarations {
                version_code: Some(bad),
                ..base()
            };
            let err = resolve_default(&decl).unwrap_err();
            assert!(matches!(err, ResolveError::InvalidVersionCode { .. }), "{bad}");
        }
    }

    #[test]
    fn test_provider_version_code_is_range_checked() {
        let decl = Declarations {
            namespace: Some(APP_ID.to_string()),
            ..Default::default()
        };
        for (properties, bad) in [
            ("flutter.versionCode=0\n", 0),
            ("flutter.versionCode=2100000001\n", 2_100_000_001),
        ] {
            let defaults = FlutterDefaults::parse_properties(properties).unwrap();
            let err = resolve(&decl, &defaults, &ResolveOptions::default()).unwrap_err();
            assert_eq!(
                err,
                ResolveError::InvalidVersionCode {
                    value: bad,
                    max: MAX_VERSION_CODE,
                }
            );
        }
    }

    #[test]
    fn test_future_schema_rejected() {
        let decl = Declarations {
            schema_version: Some(2),
            ..base()
        };
        let err = resolve_default(&decl).unwrap_err();
        assert_eq!(
            err,
            ResolveError::UnsupportedSchemaVersion {
                found: 2,
                supported: 1
            }
        );
    }

    #[test]
    fn test_multidex_injection_policy() {
        let decl = Declarations {
            multi_dex_enabled: Some(true),
            ..base()
        };

        let resolution = resolve_default(&decl).unwrap();
        assert!(resolution.config.dependency_pins()[&Coordinate::multidex()].injected);
        assert_eq!(resolution.warnings[0].code, "DEPENDENCY_INJECTED");

        let strict = ResolveOptions {
            inject_multidex: false,
            ..ResolveOptions::default()
        };
        let err = resolve(&decl, &flutter_like(), &strict).unwrap_err();
        assert!(matches!(err, ResolveError::MissingRequiredDependency { .. }));
    }

    #[test]
    fn test_multidex_pin_required_at_any_min_sdk() {
        let strict = ResolveOptions {
            inject_multidex: false,
            ..ResolveOptions::default()
        };
        for min in [19, 21, 26] {
            let decl = Declarations {
                min_sdk_version: Some(min),
                multi_dex_enabled: Some(true),
                ..base()
            };
            let err = resolve(&decl, &flutter_like(), &strict).unwrap_err();
            assert_eq!(err.field(), "multiDexEnabled", "minSdk {min}");
        }
    }

    #[test]
    fn test_incompatible_desugaring() {
        let decl = Declarations {
            core_library_desugaring_enabled: Some(true),
            dependency_pins: pins(&[("com.android.tools:desugar_jdk_libs", "1.1.5")]),
            ..base()
        };
        let err = resolve_default(&decl).unwrap_err();
        assert!(matches!(err, ResolveError::IncompatibleDesugaringVersion { .. }));

        let lenient = ResolveOptions {
            desugaring_policy: DesugaringPolicy::Warn,
            ..ResolveOptions::default()
        };
        let resolution = resolve(&decl, &flutter_like(), &lenient).unwrap();
        assert!(resolution.config.core_library_desugaring_enabled());
        assert!(resolution.has_warnings());
    }

    #[test]
    fn test_duplicate_coordinates_fail() {
        let decl = Declarations {
            dependency_pins: pins(&[
                ("firebase-bom", "33.1.2"),
                ("com.google.firebase:firebase-bom", "32.0.0"),
            ]),
            ..base()
        };
        let err = resolve_default(&decl).unwrap_err();
        assert!(matches!(err, ResolveError::DuplicateDependencyCoordinate { .. }));
    }

    #[test]
    fn test_unknown_signing_identity_fails() {
        let mut decl = base();
        decl.build_variants.insert(
            "release".to_string(),
            VariantDeclaration {
                signing_identity: Some("upload".to_string()),
                ..Default::default()
            },
        );
        let err = resolve_default(&decl).unwrap_err();
        assert!(matches!(err, ResolveError::UnknownSigningIdentity { .. }));
    }

    #[test]
    fn test_unknown_keys_do_not_abort() {
        let mut decl = base();
        decl.unknown
            .insert("packagingOptions".to_string(), serde_json::json!({ "pickFirst": [] }));
        let resolution = resolve_default(&decl).unwrap();
        assert_eq!(resolution.warnings[0].code, "UNKNOWN_KEY");
        assert_eq!(resolution.warnings[0].field, "packagingOptions");
    }

    #[test]
    fn test_options_from_config() {
        let config = ResolveConfig {
            inject_multidex: false,
            desugaring_policy: DesugaringPolicy::Warn,
            warnings_as_errors: true,
        };
        let options = ResolveOptions::from(&config);
        assert!(!options.inject_multidex);
        assert_eq!(options.desugaring_policy, DesugaringPolicy::Warn);
    }

    proptest! {
        #[test]
        fn prop_resolved_sdk_levels_are_ordered(
            compile in 1u32..40,
            target in 1u32..40,
            min in 0u32..40,
        ) {
            let decl = Declarations {
                compile_sdk_version: Some(compile),
                target_sdk_version: Some(target),
                min_sdk_version: Some(min),
                ..base()
            };
            match resolve_default(&decl) {
                Ok(resolution) => {
                    let sdk = resolution.config.sdk();
                    prop_assert!(sdk.min <= sdk.target && sdk.target <= sdk.compile);
                }
                Err(err) => {
                    let is_range_error = matches!(err, ResolveError::InvalidSdkRange { .. });
                    prop_assert!(is_range_error, "unexpected error: {:?}", err);
                }
            }
        }

        #[test]
        fn prop_resolution_is_idempotent(
            min in 1u32..35,
            multidex in any::<bool>(),
            desugaring in any::<bool>(),
            level in prop::sample::select(vec!["1.8", "11", "17", "21"]),
        ) {
            let decl = Declarations {
                min_sdk_version: Some(min),
                source_language_level: Some(level.to_string()),
                target_language_level: Some(level.to_string()),
                multi_dex_enabled: Some(multidex),
                core_library_desugaring_enabled: Some(desugaring),
                dependency_pins: pins(&[("desugar_jdk_libs", "2.0.4"), ("firebase-bom", "33.1.2")]),
                ..base()
            };
            let first = resolve_default(&decl);
            let second = resolve_default(&decl);
            prop_assert_eq!(first, second);
        }
    }
}
