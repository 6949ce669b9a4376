//! Android build-variant resolution for SafeTravel Flutter apps
//!
//! This crate turns declarative build options into a validated
//! [`BuildVariantConfig`] for the Gradle toolchain:
//! - Declaration parsing (TOML or JSON)
//! - Toolchain defaults through an injected [`DefaultProvider`]
//! - SDK level, language level, dependency and signing validation
//! - Rendering of the resolved descriptor as a Gradle Kotlin script
//!
//! # Example
//!
//! ```rust
//! use safetravel_android::{resolve, Declarations, FlutterDefaults, ResolveOptions};
//!
//! let declarations = Declarations::from_toml_str(r#"
//!     namespace = "tech.safetravel.smarttourist.smart_tourist_app"
//!     compileSdkVersion = 34
//!     targetSdkVersion = 34
//!     sourceLanguageLevel = "17"
//!     targetLanguageLevel = "17"
//! "#).unwrap();
//!
//! let resolution = resolve(&declarations, &FlutterDefaults::new(), &ResolveOptions::default()).unwrap();
//! assert_eq!(resolution.config.sdk().min, 21);
//! ```

#![warn(missing_docs)]

pub mod declarations;
pub mod defaults;
pub mod dependency;
pub mod error;
pub mod language;
pub mod model;
pub mod render;
pub mod resolver;
pub mod sdk;
pub mod signing;

pub use declarations::Declarations;
pub use defaults::{DefaultProvider, FlutterDefaults, StaticDefaults};
pub use error::{ResolveError, ResolveErrorCode};
pub use model::{BuildVariantConfig, Resolution, CURRENT_SCHEMA_VERSION};
pub use resolver::{resolve, ResolveOptions};
