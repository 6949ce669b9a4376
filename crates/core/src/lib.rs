//! Core utilities for SafeTravel build tools
//!
//! This crate provides shared functionality used by the Android tooling:
//!
//! - **Error handling**: Errors with codes, context, and recovery suggestions
//! - **Validation**: Field-level validation results with errors and warnings
//! - **Configuration**: TOML-based tool configuration with defaults
//!
//! # Example
//!
//! ```rust,no_run
//! use safetravel_core::config::Config;
//!
//! let config = Config::load(None).expect("config");
//! println!("declarations: {}", config.schema.general.declarations);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod validation;

pub use error::{Error, ErrorCode, Result, ResultExt};

