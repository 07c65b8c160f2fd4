//! Polling configuration
//!
//! Defaults for the interval and not-found limit used by call sites, stored
//! globally and optionally overridden per profile.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::poller::{DEFAULT_MIN_INTERVAL, DEFAULT_NOT_FOUND_CHECKS};

/// Polling defaults for call sites
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Minimum seconds between two status checks
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Consecutive not-found checks tolerated while waiting on a pending delete
    #[serde(default = "default_not_found_checks")]
    pub not_found_checks: u32,

    /// Consecutive successful checks required before a new directory counts as visible
    #[serde(default = "default_continuous_target_occurrence")]
    pub continuous_target_occurrence: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            not_found_checks: default_not_found_checks(),
            continuous_target_occurrence: default_continuous_target_occurrence(),
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Per-profile polling override; unset fields fall back to the global section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PollingOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_found_checks: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuous_target_occurrence: Option<u32>,
}

impl PollingConfig {
    pub fn merge(&self, overrides: &PollingOverride) -> PollingConfig {
        PollingConfig {
            interval_secs: overrides.interval_secs.unwrap_or(self.interval_secs),
            not_found_checks: overrides.not_found_checks.unwrap_or(self.not_found_checks),
            continuous_target_occurrence: overrides
                .continuous_target_occurrence
                .unwrap_or(self.continuous_target_occurrence),
        }
    }
}

// Default value functions for serde
fn default_interval_secs() -> u64 {
    DEFAULT_MIN_INTERVAL.as_secs()
}

fn default_not_found_checks() -> u32 {
    DEFAULT_NOT_FOUND_CHECKS
}

fn default_continuous_target_occurrence() -> u32 {
    5
}
