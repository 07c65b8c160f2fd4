//! CLI structure and command definitions

use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;

/// Wait for eventually consistent resources to settle
#[derive(Parser, Debug)]
#[command(name = "statewait")]
#[command(version, about = "Wait for eventually consistent resources to settle")]
#[command(long_about = "
Wait for eventually consistent resources to settle

A write that was accepted is not always visible to the next read. statewait
polls until the resource reports a target state, giving up when a deadline
passes or when it keeps coming back as not found.

EXAMPLES:
    # Wait until a URL answers 200, polling every 5 seconds for up to 2 minutes
    statewait wait https://example.com/health --interval 5 --timeout 120

    # Treat 202 as still in progress as well
    statewait wait https://example.com/job/42 --pending 404,202 --target 200

    # Create a share, waiting out a delete of the same name
    statewait storage share create myaccount logs --quota 100

    # Create a directory and wait until it is consistently visible
    statewait storage directory create myaccount logs 2024/01

    # Show the effective timeouts per resource kind
    statewait config timeouts -o json

For more help on a specific command, run:
    statewait <command> --help
")]
pub struct Cli {
    /// Profile to use for this command
    #[arg(long, short, global = true, env = "STATEWAIT_PROFILE")]
    pub profile: Option<String>,

    /// Path to alternate configuration file
    #[arg(long, global = true, env = "STATEWAIT_CONFIG_FILE")]
    pub config_file: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value = "table")]
    pub output: OutputFormat,

    /// Enable verbose logging
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll an HTTP endpoint until it answers with a target status
    #[command(after_help = "EXAMPLES:
    # Defaults: pending 404, target 200, 404 counted as not found
    statewait wait https://example.com/resource

    # Require five consecutive 200s before declaring success
    statewait wait https://example.com/resource --continuous-target 5

    # Give up after 3 not-found responses
    statewait wait https://example.com/resource --not-found-checks 3
")]
    Wait(WaitArgs),

    /// Storage data-plane operations that wait for consistency
    #[command(subcommand)]
    Storage(StorageCommands),

    /// Profile management
    #[command(subcommand, visible_alias = "prof")]
    Profile(ProfileCommands),

    /// Configuration inspection
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Show version information
    #[command(visible_alias = "ver")]
    Version,
}

#[derive(Args, Debug, Clone)]
pub struct WaitArgs {
    /// URL to poll with GET
    pub url: String,

    /// Status codes that mean "not there yet, keep polling"
    #[arg(long, value_delimiter = ',', default_value = "404")]
    pub pending: Vec<u16>,

    /// Status codes that mean success
    #[arg(long, value_delimiter = ',', default_value = "200")]
    pub target: Vec<u16>,

    /// Status codes reported as "not found" and counted against --not-found-checks
    #[arg(long, value_delimiter = ',', default_value = "404")]
    pub not_found_status: Vec<u16>,

    /// Seconds between polls (defaults to the configured polling interval)
    #[arg(long)]
    pub interval: Option<u64>,

    /// Overall timeout in seconds
    #[arg(long, default_value = "1800")]
    pub timeout: u64,

    /// Maximum consecutive not-found responses (defaults to the configured limit)
    #[arg(long)]
    pub not_found_checks: Option<u32>,

    /// Consecutive target responses required before succeeding
    #[arg(long, default_value = "1")]
    pub continuous_target: u32,

    /// Seconds to wait before the first poll
    #[arg(long, default_value = "0")]
    pub delay: u64,

    /// Extra request header as NAME:VALUE (repeatable)
    #[arg(long = "header", short = 'H', value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Don't print a line per poll to stderr
    #[arg(long, short)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum StorageCommands {
    /// File shares
    #[command(subcommand)]
    Share(ShareCommands),

    /// Blob containers
    #[command(subcommand)]
    Container(ContainerCommands),

    /// Directories inside a file share
    #[command(subcommand, visible_alias = "dir")]
    Directory(DirectoryCommands),
}

#[derive(Subcommand, Debug)]
pub enum ShareCommands {
    /// Create a share, waiting out a pending delete of the same name
    Create {
        /// Storage account name
        account: String,
        /// Share name
        name: String,
        /// Metadata as KEY=VALUE (repeatable)
        #[arg(long = "metadata", short = 'm', value_parser = parse_key_val)]
        metadata: Vec<(String, String)>,
        /// Quota in GiB
        #[arg(long)]
        quota: Option<u32>,
        /// Access tier (TransactionOptimized, Hot, Cool, Premium)
        #[arg(long)]
        access_tier: Option<String>,
        /// Enabled protocol (SMB or NFS)
        #[arg(long)]
        enabled_protocol: Option<String>,
        /// Override the create timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Check whether a share exists and show its properties
    Exists {
        account: String,
        name: String,
    },
    /// Delete a share and its snapshots
    Delete {
        account: String,
        name: String,
        /// Override the delete timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ContainerCommands {
    /// Create a container, waiting out a pending delete of the same name
    Create {
        account: String,
        name: String,
        #[arg(long = "metadata", short = 'm', value_parser = parse_key_val)]
        metadata: Vec<(String, String)>,
        /// Public access level (blob or container); private when omitted
        #[arg(long)]
        access_level: Option<String>,
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Check whether a container exists and show its properties
    Exists { account: String, name: String },
    /// Delete a container
    Delete {
        account: String,
        name: String,
        #[arg(long)]
        timeout: Option<u64>,
    },
}

#[derive(Subcommand, Debug)]
pub enum DirectoryCommands {
    /// Create a directory and wait until it is consistently visible
    Create {
        account: String,
        share: String,
        /// Directory path inside the share, `/` separated
        path: String,
        #[arg(long = "metadata", short = 'm', value_parser = parse_key_val)]
        metadata: Vec<(String, String)>,
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Check whether a directory exists and show its metadata
    Exists {
        account: String,
        share: String,
        path: String,
    },
    /// Delete an empty directory
    Delete {
        account: String,
        share: String,
        path: String,
        #[arg(long)]
        timeout: Option<u64>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// List configured profiles
    #[command(visible_alias = "ls")]
    List,
    /// Create or update a profile
    Set {
        name: String,
        /// DNS suffix of the storage endpoints
        #[arg(long)]
        endpoint_suffix: Option<String>,
        /// Fixed endpoint for all data-plane traffic (emulators, proxies)
        #[arg(long)]
        endpoint: Option<String>,
        /// Bearer token (use ${VAR} to keep it out of the file)
        #[arg(long)]
        bearer_token: Option<String>,
        /// SAS query string
        #[arg(long)]
        sas_token: Option<String>,
        /// Polling interval in seconds for this profile
        #[arg(long)]
        interval: Option<u64>,
        /// Make this the default profile
        #[arg(long)]
        default: bool,
    },
    /// Remove a profile
    #[command(visible_alias = "rm")]
    Remove { name: String },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the loaded configuration with secrets masked
    Show,
    /// Print the configuration file path
    Path,
    /// Show effective timeouts per resource kind
    Timeouts,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:VALUE, got '{s}'"))?;
    if name.trim().is_empty() {
        return Err(format!("empty header name in '{s}'"));
    }
    Ok((name.trim().to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("owner=ops").unwrap(),
            ("owner".to_string(), "ops".to_string())
        );
        assert_eq!(
            parse_key_val("empty=").unwrap(),
            ("empty".to_string(), String::new())
        );
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=x").is_err());
    }

    #[test]
    fn test_parse_header() {
        assert_eq!(
            parse_header("Accept: application/json").unwrap(),
            ("Accept".to_string(), "application/json".to_string())
        );
        assert!(parse_header("Accept").is_err());
    }

    #[test]
    fn test_wait_defaults() {
        let cli = Cli::parse_from(["statewait", "wait", "http://localhost/x"]);
        let Commands::Wait(args) = cli.command else {
            panic!("expected wait command");
        };
        assert_eq!(args.pending, vec![404]);
        assert_eq!(args.target, vec![200]);
        assert_eq!(args.not_found_status, vec![404]);
        assert_eq!(args.timeout, 1800);
        assert_eq!(args.continuous_target, 1);
        assert_eq!(args.interval, None);
    }

    #[test]
    fn test_wait_status_lists() {
        let cli = Cli::parse_from([
            "statewait",
            "wait",
            "http://localhost/x",
            "--pending",
            "404,202",
            "--target",
            "200,204",
        ]);
        let Commands::Wait(args) = cli.command else {
            panic!("expected wait command");
        };
        assert_eq!(args.pending, vec![404, 202]);
        assert_eq!(args.target, vec![200, 204]);
    }
}
