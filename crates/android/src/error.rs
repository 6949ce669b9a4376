//! Error types for build-variant resolution.

use safetravel_core::error::{Error, ErrorCode};
use thiserror::Error;

/// Result type alias for resolution.
pub type Result<T> = std::result::Result<T, ResolveError>;

/// A violated declaration invariant.
///
/// Every variant names the offending field(s) so the message can point
/// the user at the declaration to fix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// `minSdk <= targetSdk <= compileSdk` does not hold
    #[error("{fields}: invalid SDK range: {detail}")]
    InvalidSdkRange {
        /// Fields involved in the violated ordering
        fields: String,
        /// Which bound was crossed
        detail: String,
    },

    /// Language level is unsupported or levels disagree
    #[error("{field}: unsupported language level: {detail}")]
    UnsupportedLanguageLevel {
        /// Offending field
        field: String,
        /// Supported set or mismatch description
        detail: String,
    },

    /// A toggle requires a dependency that is not pinned
    #[error("{field}: requires dependency {coordinate}, which is not pinned in dependencyPins")]
    MissingRequiredDependency {
        /// Toggle requiring the dependency
        field: String,
        /// Coordinate that must be pinned
        coordinate: String,
    },

    /// Pinned desugaring runtime is known to break with the compile SDK
    #[error(
        "dependencyPins.{coordinate}: desugaring runtime {version} is incompatible with compileSdkVersion {compile_sdk} ({detail})"
    )]
    IncompatibleDesugaringVersion {
        /// Desugaring coordinate
        coordinate: String,
        /// Pinned version
        version: String,
        /// Resolved compile SDK
        compile_sdk: u32,
        /// Supported compile SDK range for the version
        detail: String,
    },

    /// A variant references a signing configuration that is not declared
    #[error(
        "buildVariants.{variant}.signingIdentity: unknown signing identity '{identity}' (declared: {declared})"
    )]
    UnknownSigningIdentity {
        /// Variant name
        variant: String,
        /// Referenced identity
        identity: String,
        /// Declared signing configurations
        declared: String,
    },

    /// Two pins canonicalise to the same coordinate
    #[error("dependencyPins: duplicate coordinate {coordinate} (declared as '{first}' and '{second}')")]
    DuplicateDependencyCoordinate {
        /// Canonical coordinate
        coordinate: String,
        /// First raw key
        first: String,
        /// Second raw key
        second: String,
    },

    /// A field has neither a declaration nor a default
    #[error("{field}: required, but neither declared nor supplied by defaults ({provider})")]
    MissingRequiredField {
        /// Missing field
        field: String,
        /// Default provider consulted
        provider: String,
    },

    /// Identifier or coordinate is syntactically invalid
    #[error("{field}: '{value}' is not a valid {expected}")]
    InvalidIdentifier {
        /// Offending field
        field: String,
        /// Raw value
        value: String,
        /// What the value should look like
        expected: String,
    },

    /// Version code outside the range accepted by the store
    #[error("versionCode: {value} is outside 1..={max}")]
    InvalidVersionCode {
        /// Declared or defaulted value
        value: i64,
        /// Largest accepted value
        max: u32,
    },

    /// Declarations were written for a newer schema
    #[error("schemaVersion: {found} is not supported (supported: 1..={supported})")]
    UnsupportedSchemaVersion {
        /// Declared schema version
        found: u32,
        /// Highest supported schema version
        supported: u32,
    },
}

/// Error code for integration with safetravel-core error handling.
/// Range: 9xxx for resolution errors.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum ResolveErrorCode {
    InvalidSdkRange = 9001,
    UnsupportedLanguageLevel = 9002,
    MissingRequiredDependency = 9003,
    IncompatibleDesugaringVersion = 9004,
    UnknownSigningIdentity = 9005,
    DuplicateDependencyCoordinate = 9006,
    MissingRequiredField = 9007,
    InvalidIdentifier = 9008,
    InvalidVersionCode = 9009,
    UnsupportedSchemaVersion = 9010,
}

impl ResolveError {
    /// Returns the error code for this error.
    pub fn code(&self) -> ResolveErrorCode {
        match self {
            ResolveError::InvalidSdkRange { .. } => ResolveErrorCode::InvalidSdkRange,
            ResolveError::UnsupportedLanguageLevel { .. } => ResolveErrorCode::UnsupportedLanguageLevel,
            ResolveError::MissingRequiredDependency { .. } => {
                ResolveErrorCode::MissingRequiredDependency
            }
            ResolveError::IncompatibleDesugaringVersion { .. } => {
                ResolveErrorCode::IncompatibleDesugaringVersion
            }
            ResolveError::UnknownSigningIdentity { .. } => ResolveErrorCode::UnknownSigningIdentity,
            ResolveError::DuplicateDependencyCoordinate { .. } => {
                ResolveErrorCode::DuplicateDependencyCoordinate
            }
            ResolveError::MissingRequiredField { .. } => ResolveErrorCode::MissingRequiredField,
            ResolveError::InvalidIdentifier { .. } => ResolveErrorCode::InvalidIdentifier,
            ResolveError::InvalidVersionCode { .. } => ResolveErrorCode::InvalidVersionCode,
            ResolveError::UnsupportedSchemaVersion { .. } => {
                ResolveErrorCode::UnsupportedSchemaVersion
            }
        }
    }

    /// The offending field path(s).
    pub fn field(&self) -> String {
        match self {
            ResolveError::InvalidSdkRange { fields, .. } => fields.clone(),
            ResolveError::UnsupportedLanguageLevel { field, .. }
            | ResolveError::MissingRequiredDependency { field, .. }
            | ResolveError::MissingRequiredField { field, .. }
            | ResolveError::InvalidIdentifier { field, .. } => field.clone(),
            ResolveError::IncompatibleDesugaringVersion { coordinate, .. } => {
                format!("dependencyPins.{coordinate}")
            }
            ResolveError::UnknownSigningIdentity { variant, .. } => {
                format!("buildVariants.{variant}.signingIdentity")
            }
            ResolveError::DuplicateDependencyCoordinate { .. } => "dependencyPins".to_string(),
            ResolveError::InvalidVersionCode { .. } => "versionCode".to_string(),
            ResolveError::UnsupportedSchemaVersion { .. } => "schemaVersion".to_string(),
        }
    }

    fn suggestion(&self) -> &'static str {
        match self {
            ResolveError::InvalidSdkRange { .. } => {
                "Keep minSdkVersion <= targetSdkVersion <= compileSdkVersion"
            }
            ResolveError::UnsupportedLanguageLevel { .. } => {
                "Use the same supported level (1.8, 11, 17 or 21) for source, target and kotlinJvmTarget"
            }
            ResolveError::MissingRequiredDependency { .. } => {
                "Add the dependency to dependencyPins or disable the toggle"
            }
            ResolveError::IncompatibleDesugaringVersion { .. } => {
                "Pin a desugar_jdk_libs version supported by the compile SDK"
            }
            ResolveError::UnknownSigningIdentity { .. } => {
                "Declare the identity under signingConfigs or reference 'debug'"
            }
            ResolveError::DuplicateDependencyCoordinate { .. } => {
                "Pin each dependency coordinate exactly once"
            }
            ResolveError::MissingRequiredField { field, .. } if field == "namespace" => {
                "Declare namespace or applicationId, or set [general] application_id in .safetravel.toml"
            }
            ResolveError::MissingRequiredField { .. } => "Declare the field explicitly",
            ResolveError::InvalidIdentifier { .. } => {
                "Use a reverse-domain identifier such as tech.safetravel.app"
            }
            ResolveError::InvalidVersionCode { .. } => {
                "Use a versionCode between 1 and 2100000000 (check flutter.versionCode in local.properties)"
            }
            ResolveError::UnsupportedSchemaVersion { .. } => {
                "Upgrade safetravel-android or lower schemaVersion"
            }
        }
    }
}

impl From<ResolveError> for Error {
    fn from(err: ResolveError) -> Self {
        let suggestion = err.suggestion();
        Error::new(ErrorCode::ConstraintViolation, err.to_string())
            .with_context(format!("E{} while resolving {}", err.code() as u32, err.field()))
            .with_suggestion(suggestion)
    }
}
