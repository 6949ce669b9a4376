//! Java/Kotlin language levels

use crate::error::{ResolveError, Result};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A Java language level understood by the Android toolchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LanguageLevel {
    /// Java 8 (`1.8`)
    Java8,
    /// Java 11
    Java11,
    /// Java 17
    Java17,
    /// Java 21
    Java21,
}

/// Levels the toolchain accepts, oldest first.
pub const SUPPORTED_LEVELS: [LanguageLevel; 4] = [
    LanguageLevel::Java8,
    LanguageLevel::Java11,
    LanguageLevel::Java17,
    LanguageLevel::Java21,
];

impl LanguageLevel {
    /// Canonical tag, as used by `kotlinOptions.jvmTarget`
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageLevel::Java8 => "1.8",
            LanguageLevel::Java11 => "11",
            LanguageLevel::Java17 => "17",
            LanguageLevel::Java21 => "21",
        }
    }

    /// The `JavaVersion` constant for `compileOptions`
    pub fn gradle_constant(&self) -> &'static str {
        match self {
            LanguageLevel::Java8 => "JavaVersion.VERSION_1_8",
            LanguageLevel::Java11 => "JavaVersion.VERSION_11",
            LanguageLevel::Java17 => "JavaVersion.VERSION_17",
            LanguageLevel::Java21 => "JavaVersion.VERSION_21",
        }
    }

    fn supported_list() -> String {
        SUPPORTED_LEVELS
            .iter()
            .map(LanguageLevel::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for LanguageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LanguageLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Raw tag that does not name a supported level
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised language level '{0}'")]
pub struct ParseLanguageLevelError(pub String);

impl FromStr for LanguageLevel {
    type Err = ParseLanguageLevelError;

    /// Accepts `17`, `1.8`, `8`, `VERSION_1_8` and `JavaVersion.VERSION_17`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let tag = s.trim();
        let tag = tag.strip_prefix("JavaVersion.").unwrap_or(tag);
        let tag = tag.strip_prefix("VERSION_").unwrap_or(tag).replace('_', ".");

        match tag.as_str() {
            "1.8" | "8" => Ok(LanguageLevel::Java8),
            "11" => Ok(LanguageLevel::Java11),
            "17" => Ok(LanguageLevel::Java17),
            "21" => Ok(LanguageLevel::Java21),
            _ => Err(ParseLanguageLevelError(s.to_string())),
        }
    }
}

/// Resolved `compileOptions` and `kotlinOptions` levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageLevels {
    /// `sourceCompatibility`
    pub source: LanguageLevel,
    /// `targetCompatibility`
    pub target: LanguageLevel,
    /// `kotlinOptions.jvmTarget`
    pub kotlin_jvm_target: LanguageLevel,
}

fn parse_field(field: &str, raw: &str) -> Result<LanguageLevel> {
    raw.parse().map_err(|_| ResolveError::UnsupportedLanguageLevel {
        field: field.to_string(),
        detail: format!(
            "'{}' is not one of {}",
            raw,
            LanguageLevel::supported_list()
        ),
    })
}

/// Parse the three level tags and check they agree.
///
/// # Errors
///
/// `UnsupportedLanguageLevel` when a tag is outside the supported set or
/// the levels differ.
pub fn resolve_levels(source: &str, target: &str, kotlin_jvm_target: &str) -> Result<LanguageLevels> {
    let source_level = parse_field("sourceLanguageLevel", source)?;
    let target_level = parse_field("targetLanguageLevel", target)?;

    if source_level != target_level {
        return Err(ResolveError::UnsupportedLanguageLevel {
            field: "sourceLanguageLevel, targetLanguageLevel".to_string(),
            detail: format!(
                "source {source_level} and target {target_level} must be equal"
            ),
        });
    }

    let jvm_level = parse_field("kotlinJvmTarget", kotlin_jvm_target)?;
    if jvm_level != target_level {
        return Err(ResolveError::UnsupportedLanguageLevel {
            field: "kotlinJvmTarget".to_string(),
            detail: format!("jvmTarget {jvm_level} must match target {target_level}"),
        });
    }

    Ok(LanguageLevels {
        source: source_level,
        target: target_level,
        kotlin_jvm_target: jvm_level,
    })
}
