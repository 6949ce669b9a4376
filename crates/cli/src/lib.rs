//! Terminal output helpers for SafeTravel tools
//!
//! - Status messages
//! - Validation issue listings
//! - Count formatting

#![warn(missing_docs)]

pub mod output;
