//! Configuration and input validation
//!
//! Provides field-level validation for:
//! - Identifiers and formats
//! - Numeric ranges and orderings
//! - Unknown configuration keys (reported as warnings)
//!
//! # Example
//!
//! ```rust
//! use safetravel_core::validation::Validator;
//!
//! let result = Validator::new()
//!     .range("versionCode", 7_u32, 1, 2_100_000_000)
//!     .ordered("minSdkVersion", 21, "targetSdkVersion", 34)
//!     .validate();
//!
//! assert!(result.is_valid());
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single validation finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Field that failed validation
    pub field: String,
    /// Human-readable message
    pub message: String,
    /// Machine-readable code
    pub code: String,
    /// Expected value (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// Actual value (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

impl ValidationIssue {
    /// Create an issue with no expected/actual detail
    pub fn new(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            code: code.into(),
            expected: None,
            actual: None,
        }
    }

    /// Attach the expected value
    #[must_use]
    pub fn expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    /// Attach the actual value
    #[must_use]
    pub fn actual(mut self, actual: impl Into<String>) -> Self {
        self.actual = Some(actual.into());
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Create a new empty result
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if validation passed
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get all errors
    #[must_use]
    pub fn errors(&self) -> &[ValidationIssue] {
        &self.errors
    }

    /// Get all warnings
    #[must_use]
    pub fn warnings(&self) -> &[ValidationIssue] {
        &self.warnings
    }

    /// Add an error
    pub fn add_error(&mut self, error: ValidationIssue) {
        self.errors.push(error);
    }

    /// Add a warning
    pub fn add_warning(&mut self, warning: ValidationIssue) {
        self.warnings.push(warning);
    }

    /// Merge another result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Consume the result, keeping only the warnings
    #[must_use]
    pub fn into_warnings(self) -> Vec<ValidationIssue> {
        self.warnings
    }
}

/// Fluent validator builder
pub struct Validator {
    result: ValidationResult,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// Create a new validator
    #[must_use]
    pub fn new() -> Self {
        Self {
            result: ValidationResult::new(),
        }
    }

    /// Validate against a regex pattern
    #[must_use]
    pub fn pattern(mut self, field: &str, value: &str, pattern: &Regex, description: &str) -> Self {
        if !pattern.is_match(value) {
            self.result.add_error(
                ValidationIssue::new(field, "PATTERN", format!("Must match {description}"))
                    .expected(description)
                    .actual(value),
            );
        }
        self
    }

    /// Validate a numeric range
    #[must_use]
    pub fn range<T: PartialOrd + fmt::Display>(mut self, field: &str, value: T, min: T, max: T) -> Self {
        if value < min || value > max {
            self.result.add_error(
                ValidationIssue::new(field, "RANGE", format!("Must be between {min} and {max}"))
                    .expected(format!("{min} - {max}"))
                    .actual(value.to_string()),
            );
        }
        self
    }

    /// Validate that `lower <= upper` for two named fields
    #[must_use]
    pub fn ordered<T: PartialOrd + fmt::Display>(
        mut self,
        lower_field: &str,
        lower: T,
        upper_field: &str,
        upper: T,
    ) -> Self {
        if lower > upper {
            self.result.add_error(
                ValidationIssue::new(
                    format!("{lower_field}, {upper_field}"),
                    "ORDER",
                    format!("{lower_field} ({lower}) must not exceed {upper_field} ({upper})"),
                )
                .expected(format!("{lower_field} <= {upper_field}"))
                .actual(format!("{lower} > {upper}")),
            );
        }
        self
    }

    /// Add a warning (non-blocking)
    #[must_use]
    pub fn warn_if(mut self, field: &str, condition: bool, code: &str, message: &str) -> Self {
        if condition {
            self.result.add_warning(ValidationIssue::new(field, code, message));
        }
        self
    }

    /// Complete validation and return result
    #[must_use]
    pub fn validate(self) -> ValidationResult {
        self.result
    }
}

/// Report keys that are not in `known` as `UNKNOWN_KEY` warnings
///
/// `prefix` is prepended with a dot to build the reported field path.
pub fn validate_known_keys<'a, I>(keys: I, known: &[&str], prefix: Option<&str>) -> ValidationResult
where
    I: IntoIterator<Item = &'a String>,
{
    let mut result = ValidationResult::new();

    for key in keys {
        if !known.contains(&key.as_str()) {
            let path = match prefix {
                Some(p) => format!("{p}.{key}"),
                None => key.clone(),
            };
            result.add_warning(
                ValidationIssue::new(
                    path.clone(),
                    "UNKNOWN_KEY",
                    format!("Unknown configuration key: {path}"),
                )
                .expected(known.join(", "))
                .actual(key.clone()),
            );
        }
    }

    result
}
