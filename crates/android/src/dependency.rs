//! Dependency coordinates, version pins and toggle-driven requirements
//!
//! Pins are keyed by canonical `group:artifact` coordinates. Short aliases
//! (`multidex`, `desugar_jdk_libs`, `firebase-bom`) expand to the full
//! coordinate before duplicates are checked.

use crate::error::{ResolveError, Result};
use crate::sdk::SdkLevels;
use safetravel_core::config::DesugaringPolicy;
use safetravel_core::validation::{ValidationIssue, ValidationResult};
use semver::Version;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Version pinned when multidex is enabled without an explicit pin.
pub const DEFAULT_MULTIDEX_VERSION: &str = "2.0.1";

/// First Firebase BoM major version that drops API levels below 21.
const FIREBASE_BOM_MIN_SDK_MAJOR: u64 = 33;
const FIREBASE_MIN_SDK: u32 = 21;

/// A Maven `group:artifact` coordinate
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coordinate {
    group: String,
    artifact: String,
}

impl Coordinate {
    /// Build a coordinate from its parts
    pub fn new(group: impl Into<String>, artifact: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
        }
    }

    /// `androidx.multidex:multidex`
    pub fn multidex() -> Self {
        Self::new("androidx.multidex", "multidex")
    }

    /// `com.android.tools:desugar_jdk_libs`
    pub fn desugar_jdk_libs() -> Self {
        Self::new("com.android.tools", "desugar_jdk_libs")
    }

    /// `com.google.firebase:firebase-bom`
    pub fn firebase_bom() -> Self {
        Self::new("com.google.firebase", "firebase-bom")
    }

    /// Parse a pin key: `group:artifact` or a known short alias.
    ///
    /// # Errors
    ///
    /// `InvalidIdentifier` when the key is not a two-part coordinate.
    pub fn parse(raw: &str) -> Result<Self> {
        let key = raw.trim();
        match key {
            "multidex" => return Ok(Self::multidex()),
            "desugar_jdk_libs" => return Ok(Self::desugar_jdk_libs()),
            "firebase-bom" => return Ok(Self::firebase_bom()),
            _ => {}
        }

        let mut parts = key.split(':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(group), Some(artifact), None) if !group.is_empty() && !artifact.is_empty() => {
                Ok(Self::new(group, artifact))
            }
            _ => Err(ResolveError::InvalidIdentifier {
                field: format!("dependencyPins.{raw}"),
                value: raw.to_string(),
                expected: "dependency coordinate (group:artifact)".to_string(),
            }),
        }
    }

    /// Group id
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Artifact id
    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    /// Whether this is the multidex support library (AndroidX or legacy support)
    pub fn is_multidex(&self) -> bool {
        self.artifact == "multidex"
            && (self.group == "androidx.multidex" || self.group == "com.android.support")
    }

    /// Gradle configuration the coordinate belongs to
    pub fn scope(&self) -> DependencyScope {
        if *self == Self::desugar_jdk_libs() {
            DependencyScope::CoreLibraryDesugaring
        } else if self.artifact.ends_with("-bom") {
            DependencyScope::Platform
        } else {
            DependencyScope::Implementation
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.artifact)
    }
}

impl Serialize for Coordinate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Gradle dependency configuration, in rendering order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DependencyScope {
    /// `coreLibraryDesugaring(...)`
    CoreLibraryDesugaring,
    /// `implementation(platform(...))`
    Platform,
    /// `implementation(...)`
    Implementation,
}

/// A pinned version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyPin {
    /// Version string as declared
    pub version: String,
    /// Configuration the dependency is attached to
    pub scope: DependencyScope,
    /// Added by the resolver rather than declared
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub injected: bool,
}

/// Canonical, ordered dependency pins
pub type DependencyPins = BTreeMap<Coordinate, DependencyPin>;

/// Canonicalise raw `(key, version)` pins.
///
/// # Errors
///
/// `DuplicateDependencyCoordinate` when two keys name the same coordinate,
/// `InvalidIdentifier` for malformed keys, `MissingRequiredField` for an
/// empty version.
pub fn canonicalize_pins(raw: &[(String, String)]) -> Result<DependencyPins> {
    let mut pins = DependencyPins::new();
    let mut first_keys: HashMap<Coordinate, &str> = HashMap::new();

    for (key, version) in raw {
        let coordinate = Coordinate::parse(key)?;
        let version = version.trim();
        if version.is_empty() {
            return Err(ResolveError::MissingRequiredField {
                field: format!("dependencyPins.{key}"),
                provider: "none".to_string(),
            });
        }

        if let Some(first) = first_keys.get(&coordinate) {
            return Err(ResolveError::DuplicateDependencyCoordinate {
                coordinate: coordinate.to_string(),
                first: (*first).to_string(),
                second: key.clone(),
            });
        }
        first_keys.insert(coordinate.clone(), key.as_str());

        let scope = coordinate.scope();
        pins.insert(
            coordinate,
            DependencyPin {
                version: version.to_string(),
                scope,
                injected: false,
            },
        );
    }

    Ok(pins)
}

/// Parse a Maven version leniently: `2.0` is read as `2.0.0`.
pub fn parse_version(raw: &str) -> Option<Version> {
    let raw = raw.trim();
    if let Ok(version) = Version::parse(raw) {
        return Some(version);
    }

    let numbers: Vec<u64> = raw
        .split('.')
        .map(str::parse)
        .collect::<std::result::Result<_, _>>()
        .ok()?;
    match numbers.as_slice() {
        [major] => Some(Version::new(*major, 0, 0)),
        [major, minor] => Some(Version::new(*major, *minor, 0)),
        _ => None,
    }
}

/// Ensure a multidex pin exists when multidex is enabled.
///
/// With `inject` set, a missing pin is added at [`DEFAULT_MULTIDEX_VERSION`]
/// and reported as a warning.
///
/// # Errors
///
/// `MissingRequiredDependency` when the pin is missing and `inject` is off.
pub fn ensure_multidex(
    pins: &mut DependencyPins,
    enabled: bool,
    inject: bool,
    warnings: &mut ValidationResult,
) -> Result<()> {
    if !enabled || pins.keys().any(Coordinate::is_multidex) {
        return Ok(());
    }

    let coordinate = Coordinate::multidex();
    if !inject {
        return Err(ResolveError::MissingRequiredDependency {
            field: "multiDexEnabled".to_string(),
            coordinate: coordinate.to_string(),
        });
    }

    tracing::debug!(
        coordinate = %coordinate,
        version = DEFAULT_MULTIDEX_VERSION,
        "Injecting multidex pin"
    );
    warnings.add_warning(
        ValidationIssue::new(
            format!("dependencyPins.{coordinate}"),
            "DEPENDENCY_INJECTED",
            format!("multiDexEnabled requires {coordinate}; pinned {DEFAULT_MULTIDEX_VERSION}"),
        )
        .expected(coordinate.to_string()),
    );
    pins.insert(
        coordinate,
        DependencyPin {
            version: DEFAULT_MULTIDEX_VERSION.to_string(),
            scope: DependencyScope::Implementation,
            injected: true,
        },
    );

    Ok(())
}

/// Outcome of checking a desugaring runtime against a compile SDK
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DesugaringCompatibility {
    /// Known to work
    Compatible,
    /// Known to break; carries the supported compile SDK range
    Incompatible(String),
    /// Version could not be parsed
    Unknown,
}

struct DesugarRange {
    from: (u64, u64, u64),
    until: Option<(u64, u64, u64)>,
    min_compile: Option<u32>,
    max_compile: Option<u32>,
}

const DESUGAR_RANGES: &[DesugarRange] = &[
    DesugarRange {
        from: (0, 0, 0),
        until: Some((1, 1, 5)),
        min_compile: None,
        max_compile: Some(30),
    },
    DesugarRange {
        from: (1, 1, 5),
        until: Some((2, 0, 0)),
        min_compile: None,
        max_compile: Some(33),
    },
    DesugarRange {
        from: (2, 0, 0),
        until: Some((2, 1, 0)),
        min_compile: None,
        max_compile: None,
    },
    DesugarRange {
        from: (2, 1, 0),
        until: None,
        min_compile: Some(34),
        max_compile: None,
    },
];

/// Look up a desugaring runtime version in the compatibility table.
pub fn desugaring_compatibility(version: &str, compile_sdk: u32) -> DesugaringCompatibility {
    let Some(parsed) = parse_version(version) else {
        return DesugaringCompatibility::Unknown;
    };
    let key = (parsed.major, parsed.minor, parsed.patch);

    let Some(range) = DESUGAR_RANGES
        .iter()
        .find(|r| key >= r.from && r.until.is_none_or(|until| key < until))
    else {
        return DesugaringCompatibility::Unknown;
    };

    let too_low = range.min_compile.is_some_and(|min| compile_sdk < min);
    let too_high = range.max_compile.is_some_and(|max| compile_sdk > max);
    if too_low || too_high {
        let supported = match (range.min_compile, range.max_compile) {
            (Some(min), Some(max)) => format!("supports compileSdk {min}..={max}"),
            (Some(min), None) => format!("requires compileSdk >= {min}"),
            (None, Some(max)) => format!("supports compileSdk <= {max}"),
            (None, None) => "supports any compileSdk".to_string(),
        };
        DesugaringCompatibility::Incompatible(supported)
    } else {
        DesugaringCompatibility::Compatible
    }
}

/// Check the desugaring runtime required by `coreLibraryDesugaringEnabled`.
///
/// # Errors
///
/// `MissingRequiredDependency` when enabled without a pin.
/// `IncompatibleDesugaringVersion` for a known-incompatible pin under
/// [`DesugaringPolicy::Error`].
pub fn check_desugaring(
    pins: &DependencyPins,
    enabled: bool,
    compile_sdk: u32,
    policy: DesugaringPolicy,
    warnings: &mut ValidationResult,
) -> Result<()> {
    let coordinate = Coordinate::desugar_jdk_libs();
    let field = format!("dependencyPins.{coordinate}");

    let Some(pin) = pins.get(&coordinate) else {
        if enabled {
            return Err(ResolveError::MissingRequiredDependency {
                field: "coreLibraryDesugaringEnabled".to_string(),
                coordinate: coordinate.to_string(),
            });
        }
        return Ok(());
    };

    if !enabled {
        warnings.add_warning(ValidationIssue::new(
            field,
            "DESUGARING_UNUSED",
            "desugaring runtime is pinned but coreLibraryDesugaringEnabled is false",
        ));
        return Ok(());
    }

    match desugaring_compatibility(&pin.version, compile_sdk) {
        DesugaringCompatibility::Compatible => Ok(()),
        DesugaringCompatibility::Unknown => {
            warnings.add_warning(
                ValidationIssue::new(
                    field,
                    "UNKNOWN_DESUGARING_VERSION",
                    format!(
                        "cannot check desugaring runtime '{}' against compileSdkVersion {}",
                        pin.version, compile_sdk
                    ),
                )
                .actual(pin.version.clone()),
            );
            Ok(())
        }
        DesugaringCompatibility::Incompatible(detail) => match policy {
            DesugaringPolicy::Error => Err(ResolveError::IncompatibleDesugaringVersion {
                coordinate: coordinate.to_string(),
                version: pin.version.clone(),
                compile_sdk,
                detail,
            }),
            DesugaringPolicy::Warn => {
                warnings.add_warning(
                    ValidationIssue::new(
                        field,
                        "INCOMPATIBLE_DESUGARING_VERSION",
                        format!(
                            "desugaring runtime {} {} (compileSdkVersion is {})",
                            pin.version, detail, compile_sdk
                        ),
                    )
                    .actual(pin.version.clone()),
                );
                Ok(())
            }
        },
    }
}

/// Warn when a Firebase BoM pin needs a higher `minSdk` than declared.
pub fn check_firebase(pins: &DependencyPins, sdk: &SdkLevels, warnings: &mut ValidationResult) {
    let coordinate = Coordinate::firebase_bom();
    let Some(pin) = pins.get(&coordinate) else {
        return;
    };

    let needs_21 = parse_version(&pin.version)
        .is_some_and(|v| v.major >= FIREBASE_BOM_MIN_SDK_MAJOR);
    if needs_21 && sdk.min < FIREBASE_MIN_SDK {
        warnings.add_warning(
            ValidationIssue::new(
                format!("dependencyPins.{coordinate}"),
                "FIREBASE_MIN_SDK",
                format!(
                    "firebase-bom {} requires minSdkVersion >= {}",
                    pin.version, FIREBASE_MIN_SDK
                ),
            )
            .expected(format!(">= {FIREBASE_MIN_SDK}"))
            .actual(sdk.min.to_string()),
        );
    }
}
