//! The resolved build descriptor

use crate::dependency::DependencyPins;
use crate::language::LanguageLevel;
use crate::sdk::SdkLevels;
use crate::signing::{ResolvedVariant, SigningConfig};
use safetravel_core::validation::ValidationIssue;
use serde::Serialize;
use std::collections::BTreeMap;

/// Newest declarations schema this crate understands.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// A validated, fully-defaulted build descriptor.
///
/// Only the resolver constructs it; it is read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildVariantConfig {
    pub(crate) schema_version: u32,
    pub(crate) namespace: String,
    pub(crate) application_id: String,
    #[serde(flatten)]
    pub(crate) sdk: SdkLevels,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) ndk_version: Option<String>,
    pub(crate) version_code: u32,
    pub(crate) version_name: String,
    pub(crate) source_language_level: LanguageLevel,
    pub(crate) target_language_level: LanguageLevel,
    pub(crate) kotlin_jvm_target: LanguageLevel,
    pub(crate) multi_dex_enabled: bool,
    pub(crate) core_library_desugaring_enabled: bool,
    pub(crate) dependency_pins: DependencyPins,
    pub(crate) signing_configs: BTreeMap<String, SigningConfig>,
    pub(crate) build_variants: BTreeMap<String, ResolvedVariant>,
}

impl BuildVariantConfig {
    /// Declarations format version
    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// Code namespace
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Store identifier
    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    /// Validated SDK levels
    pub fn sdk(&self) -> SdkLevels {
        self.sdk
    }

    /// NDK release, if any
    pub fn ndk_version(&self) -> Option<&str> {
        self.ndk_version.as_deref()
    }

    /// `versionCode` within `1..=MAX_VERSION_CODE`
    pub fn version_code(&self) -> u32 {
        self.version_code
    }

    /// User-visible version
    pub fn version_name(&self) -> &str {
        &self.version_name
    }

    /// Java source compatibility
    pub fn source_language_level(&self) -> LanguageLevel {
        self.source_language_level
    }

    /// Java target compatibility
    pub fn target_language_level(&self) -> LanguageLevel {
        self.target_language_level
    }

    /// Kotlin `jvmTarget`
    pub fn kotlin_jvm_target(&self) -> LanguageLevel {
        self.kotlin_jvm_target
    }

    /// Whether multidex packaging is on
    pub fn multi_dex_enabled(&self) -> bool {
        self.multi_dex_enabled
    }

    /// Whether library desugaring is on
    pub fn core_library_desugaring_enabled(&self) -> bool {
        self.core_library_desugaring_enabled
    }

    /// Canonical pins, including injected ones
    pub fn dependency_pins(&self) -> &DependencyPins {
        &self.dependency_pins
    }

    /// Signing configurations, including the implicit `debug`
    pub fn signing_configs(&self) -> &BTreeMap<String, SigningConfig> {
        &self.signing_configs
    }

    /// Variants with their signing identities bound
    pub fn build_variants(&self) -> &BTreeMap<String, ResolvedVariant> {
        &self.build_variants
    }

    /// Look up one variant by name
    pub fn variant(&self, name: &str) -> Option<&ResolvedVariant> {
        self.build_variants.get(name)
    }

    /// The signing config a variant is bound to, if any
    pub fn signing_config_for(&self, variant: &str) -> Option<(&str, &SigningConfig)> {
        let identity = self.variant(variant)?.signing_identity.as_deref()?;
        self.signing_configs
            .get_key_value(identity)
            .map(|(name, config)| (name.as_str(), config))
    }
}

/// Result of a successful resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// The resolved descriptor
    pub config: BuildVariantConfig,
    /// Non-fatal findings, in the order they were raised
    pub warnings: Vec<ValidationIssue>,
}

impl Resolution {
    /// Whether any warning was raised
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
