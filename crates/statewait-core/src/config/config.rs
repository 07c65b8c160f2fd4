//! Configuration management for statewait
//!
//! Handles configuration loading from files and environment variables.
//! Configuration is stored in TOML format with support for multiple named profiles.

#[cfg(target_os = "macos")]
use directories::BaseDirs;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use super::error::{ConfigError, Result};
use super::polling::{PollingConfig, PollingOverride};
use crate::timeouts::{ResourceKind, ResourceTimeouts, TimeoutOverrides};

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    /// Profile used when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
    /// Global polling defaults
    #[serde(default)]
    pub polling: PollingConfig,
    /// Timeout overrides keyed by resource kind (e.g. `storage_share`)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub timeouts: BTreeMap<String, TimeoutOverrides>,
    /// Map of profile name -> profile configuration
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

/// Individual profile configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Profile {
    /// DNS suffix of the storage endpoints (`{account}.{service}.{suffix}`)
    #[serde(default = "default_endpoint_suffix")]
    pub endpoint_suffix: String,
    /// Fixed endpoint that receives all data-plane traffic (emulators, proxies)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Pre-issued bearer token sent as `Authorization`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,
    /// Pre-issued SAS query string appended to every request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sas_token: Option<String>,
    /// Polling override for this profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polling: Option<PollingOverride>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            endpoint_suffix: default_endpoint_suffix(),
            endpoint: None,
            bearer_token: None,
            sas_token: None,
            polling: None,
        }
    }
}

fn default_endpoint_suffix() -> String {
    "core.windows.net".to_string()
}

impl Config {
    /// First profile name in alphabetical order
    pub fn first_profile(&self) -> Option<&str> {
        let mut names: Vec<_> = self.profiles.keys().map(String::as_str).collect();
        names.sort();
        names.first().copied()
    }

    /// Resolve the profile name to use
    ///
    /// Explicit name, then `default_profile`, then the first profile.
    pub fn resolve_profile(&self, explicit_profile: Option<&str>) -> Result<String> {
        if let Some(profile_name) = explicit_profile {
            return Ok(profile_name.to_string());
        }

        if let Some(ref default) = self.default_profile {
            return Ok(default.clone());
        }

        if let Some(profile_name) = self.first_profile() {
            return Ok(profile_name.to_string());
        }

        Err(ConfigError::NoProfileSelected {
            suggestion: "Add a [profiles.<name>] section to the config file or pass --profile."
                .to_string(),
        })
    }

    /// Look up a profile by name
    pub fn profile(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound {
                name: name.to_string(),
            })
    }

    /// Profile to use for a command
    ///
    /// Like [`Config::resolve_profile`], but an empty configuration yields the
    /// default profile (public endpoints, no token) instead of an error.
    pub fn effective_profile(&self, explicit_profile: Option<&str>) -> Result<(String, Profile)> {
        if explicit_profile.is_none() && self.default_profile.is_none() && self.profiles.is_empty()
        {
            return Ok(("default".to_string(), Profile::default()));
        }

        let name = self.resolve_profile(explicit_profile)?;
        let profile = self.profile(&name)?.clone();
        Ok((name, profile))
    }

    /// Polling settings for a profile, falling back to the global section
    pub fn polling_for(&self, profile: &Profile) -> PollingConfig {
        match &profile.polling {
            Some(overrides) => self.polling.merge(overrides),
            None => self.polling.clone(),
        }
    }

    /// Timeouts for a resource kind with configuration overrides applied
    pub fn timeouts_for(&self, kind: ResourceKind) -> ResourceTimeouts {
        let defaults = kind.default_timeouts();
        match self.timeouts.get(kind.as_str()) {
            Some(overrides) => defaults.merge(overrides),
            None => defaults,
        }
    }

    /// Load configuration from the standard location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::LoadError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        // Expand environment variables in the config content
        let expanded_content = Self::expand_env_vars(&content);

        let config: Config = toml::from_str(&expanded_content)?;

        Ok(config)
    }

    /// Save configuration to the standard location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to_path(&config_path)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        // Create parent directories if they don't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::SaveError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        fs::write(config_path, content).map_err(|e| ConfigError::SaveError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        Ok(())
    }

    /// Set or update a profile
    pub fn set_profile(&mut self, name: String, profile: Profile) {
        self.profiles.insert(name, profile);
    }

    /// Remove a profile by name
    pub fn remove_profile(&mut self, name: &str) -> Option<Profile> {
        if self.default_profile.as_deref() == Some(name) {
            self.default_profile = None;
        }
        self.profiles.remove(name)
    }

    /// List all profiles sorted by name
    pub fn list_profiles(&self) -> Vec<(&String, &Profile)> {
        let mut profiles: Vec<_> = self.profiles.iter().collect();
        profiles.sort_by_key(|(name, _)| *name);
        profiles
    }

    /// Get the path to the configuration file
    ///
    /// On macOS, this supports both the standard macOS path and Linux-style ~/.config path:
    /// 1. Check ~/.config/statewait/config.toml (Linux-style, preferred for consistency)
    /// 2. Fall back to ~/Library/Application Support/statewait/config.toml (macOS standard)
    ///
    /// On Linux: ~/.config/statewait/config.toml
    /// On Windows: %APPDATA%\statewait\config.toml
    pub fn config_path() -> Result<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            if let Some(base_dirs) = BaseDirs::new() {
                let linux_style_path = base_dirs
                    .home_dir()
                    .join(".config")
                    .join("statewait")
                    .join("config.toml");

                if linux_style_path
                    .parent()
                    .map(|p| p.exists())
                    .unwrap_or(false)
                {
                    return Ok(linux_style_path);
                }
            }
        }

        let proj_dirs =
            ProjectDirs::from("", "", "statewait").ok_or(ConfigError::ConfigDirError)?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Expand environment variables in configuration content
    ///
    /// Supports ${VAR} and ${VAR:-default} syntax. Unset variables without a
    /// default are left as-is so profiles that are never used don't fail to load.
    ///
    /// Example:
    /// ```toml
    /// bearer_token = "${STORAGE_TOKEN}"
    /// endpoint_suffix = "${STORAGE_SUFFIX:-core.windows.net}"
    /// ```
    fn expand_env_vars(content: &str) -> String {
        let expanded =
            shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok());
        expanded.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn emulator_profile() -> Profile {
        Profile {
            endpoint: Some("http://127.0.0.1:10000".to_string()),
            polling: Some(PollingOverride {
                interval_secs: Some(1),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        config.set_profile("dev".to_string(), emulator_profile());
        config.default_profile = Some("dev".to_string());
        config.timeouts.insert(
            "storage_share".to_string(),
            TimeoutOverrides {
                create_secs: Some(120),
                ..Default::default()
            },
        );

        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();

        assert_eq!(config.default_profile, deserialized.default_profile);
        assert_eq!(deserialized.profiles["dev"], emulator_profile());
        assert_eq!(deserialized.timeouts, config.timeouts);
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let config: Config = toml::from_str("[profiles.prod]\n").unwrap();

        assert_eq!(config.polling, PollingConfig::default());
        assert_eq!(config.polling.interval(), Duration::from_secs(10));
        assert_eq!(config.polling.not_found_checks, 180);
        assert_eq!(config.profiles["prod"].endpoint_suffix, "core.windows.net");
    }

    #[test]
    fn test_polling_for_merges_profile_override() {
        let config = Config::default();

        let merged = config.polling_for(&emulator_profile());
        assert_eq!(merged.interval_secs, 1);
        assert_eq!(merged.not_found_checks, 180);

        let plain = config.polling_for(&Profile::default());
        assert_eq!(plain, config.polling);
    }

    #[test]
    fn test_timeouts_for_applies_overrides() {
        let content = r#"
[timeouts.storage_share]
create_secs = 60

[timeouts.open_shift_cluster]
read_secs = 30
"#;
        let config: Config = toml::from_str(content).unwrap();

        let share = config.timeouts_for(ResourceKind::StorageShare);
        assert_eq!(share.create, Duration::from_secs(60));
        assert_eq!(share.delete, Duration::from_secs(1800));

        let cluster = config.timeouts_for(ResourceKind::OpenShiftCluster);
        assert_eq!(cluster.read, Duration::from_secs(30));
        assert_eq!(cluster.create, Duration::from_secs(5400));

        let queue = config.timeouts_for(ResourceKind::StorageQueue);
        assert_eq!(queue, ResourceKind::StorageQueue.default_timeouts());
    }

    #[test]
    fn test_profile_resolution() {
        let mut config = Config::default();
        config.set_profile("zeta".to_string(), Profile::default());
        config.set_profile("alpha".to_string(), emulator_profile());

        // First alphabetically without a default
        assert_eq!(config.resolve_profile(None).unwrap(), "alpha");

        config.default_profile = Some("zeta".to_string());
        assert_eq!(config.resolve_profile(None).unwrap(), "zeta");

        // Explicit always wins
        assert_eq!(config.resolve_profile(Some("alpha")).unwrap(), "alpha");
    }

    #[test]
    fn test_no_profile_errors() {
        let config = Config::default();
        let err = config.resolve_profile(None).unwrap_err();
        assert!(err.to_string().contains("No profile selected"));
    }

    #[test]
    fn test_effective_profile() {
        let empty = Config::default();
        let (name, profile) = empty.effective_profile(None).unwrap();
        assert_eq!(name, "default");
        assert_eq!(profile, Profile::default());

        // Explicit names must exist, even on an empty config
        assert!(matches!(
            empty.effective_profile(Some("missing")),
            Err(ConfigError::ProfileNotFound { .. })
        ));

        let mut config = Config::default();
        config.set_profile("dev".to_string(), emulator_profile());
        let (name, profile) = config.effective_profile(None).unwrap();
        assert_eq!(name, "dev");
        assert_eq!(profile, emulator_profile());
    }

    #[test]
    fn test_remove_profile_clears_default() {
        let mut config = Config::default();
        config.set_profile("dev".to_string(), Profile::default());
        config.default_profile = Some("dev".to_string());

        assert!(config.remove_profile("dev").is_some());
        assert!(config.default_profile.is_none());
        assert!(config.remove_profile("dev").is_none());
    }

    #[test]
    #[serial_test::serial]
    fn test_env_var_expansion() {
        unsafe {
            std::env::set_var("STATEWAIT_TEST_TOKEN", "token-value");
        }

        let content = r#"
[profiles.test]
bearer_token = "${STATEWAIT_TEST_TOKEN}"
"#;

        let expanded = Config::expand_env_vars(content);
        assert!(expanded.contains("token-value"));

        unsafe {
            std::env::remove_var("STATEWAIT_TEST_TOKEN");
        }
    }

    #[test]
    #[serial_test::serial]
    fn test_env_var_expansion_with_defaults() {
        unsafe {
            std::env::remove_var("STATEWAIT_NONEXISTENT_VAR");
        }

        let content = r#"endpoint_suffix = "${STATEWAIT_NONEXISTENT_VAR:-core.chinacloudapi.cn}""#;
        let expanded = Config::expand_env_vars(content);
        assert_eq!(expanded, r#"endpoint_suffix = "core.chinacloudapi.cn""#);

        // Unset without default is left alone
        let content = r#"bearer_token = "${STATEWAIT_NONEXISTENT_VAR}""#;
        assert_eq!(Config::expand_env_vars(content), content);
    }
}
