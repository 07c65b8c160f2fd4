//! `statewait config`: inspect the loaded configuration

use serde::Serialize;
use statewait_core::{Config, ResourceKind};
use std::path::Path;

use crate::cli::ConfigCommands;
use crate::error::Result;
use crate::output::{self, OutputFormat};

const MASK: &str = "********";

#[derive(Debug, Serialize)]
struct TimeoutRow {
    kind: ResourceKind,
    create_secs: u64,
    read_secs: u64,
    update_secs: u64,
    delete_secs: u64,
}

pub fn handle_config(
    command: &ConfigCommands,
    config: &Config,
    config_path: &Path,
    format: OutputFormat,
) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            output::print_output(masked(config), format)?;
        }
        ConfigCommands::Path => {
            println!("{}", config_path.display());
        }
        ConfigCommands::Timeouts => {
            output::print_output(timeout_rows(config), format)?;
        }
    }
    Ok(())
}

/// Copy of the configuration with tokens hidden
fn masked(config: &Config) -> Config {
    let mut config = config.clone();
    for profile in config.profiles.values_mut() {
        if profile.bearer_token.is_some() {
            profile.bearer_token = Some(MASK.to_string());
        }
        if profile.sas_token.is_some() {
            profile.sas_token = Some(MASK.to_string());
        }
    }
    config
}

fn timeout_rows(config: &Config) -> Vec<TimeoutRow> {
    ResourceKind::ALL
        .iter()
        .map(|&kind| {
            let t = config.timeouts_for(kind);
            TimeoutRow {
                kind,
                create_secs: t.create.as_secs(),
                read_secs: t.read.as_secs(),
                update_secs: t.update.as_secs(),
                delete_secs: t.delete.as_secs(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use statewait_core::Profile;

    #[test]
    fn test_masked_hides_tokens() {
        let mut config = Config::default();
        config.set_profile(
            "dev".to_string(),
            Profile {
                bearer_token: Some("secret".to_string()),
                ..Default::default()
            },
        );

        let shown = masked(&config);
        let dev = &shown.profiles["dev"];
        assert_eq!(dev.bearer_token.as_deref(), Some(MASK));
        assert_eq!(dev.sas_token, None);
        // the loaded config keeps its tokens
        assert_eq!(
            config.profiles["dev"].bearer_token.as_deref(),
            Some("secret")
        );
    }

    #[test]
    fn test_timeout_rows_cover_every_kind() {
        let rows = timeout_rows(&Config::default());
        assert_eq!(rows.len(), ResourceKind::ALL.len());

        let openshift = rows
            .iter()
            .find(|r| r.kind == ResourceKind::OpenShiftCluster)
            .unwrap();
        assert_eq!(openshift.create_secs, 90 * 60);
        assert_eq!(openshift.read_secs, 5 * 60);
    }
}
