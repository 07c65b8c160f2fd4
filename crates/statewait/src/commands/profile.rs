//! `statewait profile`: manage profiles in the configuration file

use serde_json::json;
use statewait_core::{Config, Profile};
use std::path::Path;
use tracing::debug;

use crate::cli::ProfileCommands;
use crate::error::{CliError, Result};
use crate::output::{self, OutputFormat};

pub async fn handle_profile(
    command: &ProfileCommands,
    config: &Config,
    config_path: &Path,
    format: OutputFormat,
) -> Result<()> {
    match command {
        ProfileCommands::List => {
            let rows: Vec<_> = config
                .list_profiles()
                .into_iter()
                .map(|(name, profile)| {
                    json!({
                        "name": name,
                        "default": config.default_profile.as_deref() == Some(name.as_str()),
                        "endpoint": profile
                            .endpoint
                            .clone()
                            .unwrap_or_else(|| format!("*.{}", profile.endpoint_suffix)),
                        "auth": auth_kind(profile),
                    })
                })
                .collect();

            if rows.is_empty() && format == OutputFormat::Table {
                println!("No profiles configured.");
                return Ok(());
            }
            output::print_output(rows, format)?;
        }
        ProfileCommands::Set {
            name,
            endpoint_suffix,
            endpoint,
            bearer_token,
            sas_token,
            interval,
            default,
        } => {
            let mut config = config.clone();
            let mut profile = config.profiles.get(name).cloned().unwrap_or_default();

            if let Some(suffix) = endpoint_suffix {
                profile.endpoint_suffix = suffix.clone();
            }
            if endpoint.is_some() {
                profile.endpoint = endpoint.clone();
            }
            if bearer_token.is_some() {
                profile.bearer_token = bearer_token.clone();
            }
            if sas_token.is_some() {
                profile.sas_token = sas_token.clone();
            }
            if let Some(secs) = interval {
                let mut polling = profile.polling.unwrap_or_default();
                polling.interval_secs = Some(*secs);
                profile.polling = Some(polling);
            }

            config.set_profile(name.clone(), profile);
            if *default {
                config.default_profile = Some(name.clone());
            }
            config.save_to_path(config_path)?;
            debug!(profile = %name, path = %config_path.display(), "Saved profile");
            println!("Profile '{}' saved", name);
        }
        ProfileCommands::Remove { name } => {
            let mut config = config.clone();
            if config.remove_profile(name).is_none() {
                return Err(CliError::ProfileNotFound { name: name.clone() });
            }
            config.save_to_path(config_path)?;
            println!("Profile '{}' removed", name);
        }
    }
    Ok(())
}

fn auth_kind(profile: &Profile) -> &'static str {
    match (&profile.bearer_token, &profile.sas_token) {
        (Some(_), _) => "bearer",
        (None, Some(_)) => "sas",
        (None, None) => "none",
    }
}
