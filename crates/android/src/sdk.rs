//! Android SDK API levels

use crate::error::{ResolveError, Result};
use safetravel_core::validation::Validator;
use serde::Serialize;

/// Resolved SDK levels.
///
/// Construction through [`SdkLevels::new`] guarantees
/// `min <= target <= compile`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SdkLevels {
    /// API level compiled against
    #[serde(rename = "compileSdkVersion")]
    pub compile: u32,
    /// API level the app is tested against
    #[serde(rename = "targetSdkVersion")]
    pub target: u32,
    /// Lowest API level the app installs on
    #[serde(rename = "minSdkVersion")]
    pub min: u32,
}

impl SdkLevels {
    /// Validate and build the SDK levels.
    ///
    /// # Errors
    ///
    /// `InvalidSdkRange` when a level is zero or the ordering is violated.
    pub fn new(compile: u32, target: u32, min: u32) -> Result<Self> {
        let result = Validator::new()
            .range("minSdkVersion", min, 1, u32::MAX)
            .ordered("minSdkVersion", min, "targetSdkVersion", target)
            .ordered("targetSdkVersion", target, "compileSdkVersion", compile)
            .validate();

        if let Some(issue) = result.errors().first() {
            return Err(ResolveError::InvalidSdkRange {
                fields: issue.field.clone(),
                detail: issue.message.clone(),
            });
        }

        Ok(Self {
            compile,
            target,
            min,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_levels() {
        let sdk = SdkLevels::new(34, 34, 21).unwrap();
        assert_eq!((sdk.compile, sdk.target, sdk.min), (34, 34, 21));
    }

    #[test]
    fn test_equal_levels_are_valid() {
        assert!(SdkLevels::new(21, 21, 21).is_ok());
    }

    #[test]
    fn test_min_above_target() {
        let err = SdkLevels::new(34, 34, 35).unwrap_err();
        match err {
            ResolveError::InvalidSdkRange { fields, detail } => {
                assert_eq!(fields, "minSdkVersion, targetSdkVersion");
                assert!(detail.contains("35"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_target_above_compile() {
        let err = SdkLevels::new(33, 34, 21).unwrap_err();
        assert_eq!(err.field(), "targetSdkVersion, compileSdkVersion");
    }

    #[test]
    fn test_zero_min_sdk() {
        let err = SdkLevels::new(34, 34, 0).unwrap_err();
        assert_eq!(err.field(), "minSdkVersion");
    }
}
