//! Configuration and profile management
//!
//! # Features
//!
//! - Multiple named profiles, each pointing at a storage endpoint
//! - Global polling defaults with per-profile overrides
//! - Per-resource-kind timeout overrides
//! - Environment variable expansion in config files
//! - Platform-specific config file locations

#[allow(clippy::module_inception)]
pub mod config;
pub mod error;
pub mod polling;

// Re-export main types for convenience
pub use config::{Config, Profile};
pub use error::{ConfigError, Result};
pub use polling::{PollingConfig, PollingOverride};
