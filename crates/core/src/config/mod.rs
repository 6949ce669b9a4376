//! Configuration loading and schema definitions
//!
//! Tool-level settings shared by the SafeTravel binaries.

mod loader;
mod schema;

pub use loader::{Config, CONFIG_FILE_NAME};
pub use schema::*;
