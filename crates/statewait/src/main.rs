use anyhow::Result;
use clap::Parser;
use statewait_core::Config;
use std::path::PathBuf;
use tracing::{debug, info, trace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod error;
mod output;

use cli::{Cli, Commands};
use error::CliError;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if let Err(e) = run(&cli).await {
        e.print_diagnostic();
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    // RUST_LOG wins over the verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "statewait=warn,statewait_core=warn",
            1 => "statewait=info,statewait_core=info",
            2 => "statewait=debug,statewait_core=debug",
            _ => "statewait=trace,statewait_core=trace",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .init();

    debug!("Tracing initialized with verbosity level: {}", verbose);
}

/// Load the configuration from `--config-file` or the default location
fn load_config(cli: &Cli) -> Result<(Config, PathBuf), CliError> {
    match &cli.config_file {
        Some(file) => {
            let path = PathBuf::from(file);
            debug!("Loading config from explicit path: {:?}", path);
            Ok((Config::load_from_path(&path)?, path))
        }
        None => {
            let path = Config::config_path()?;
            debug!("Loading config from default location: {:?}", path);
            Ok((Config::load_from_path(&path)?, path))
        }
    }
}

async fn run(cli: &Cli) -> Result<(), CliError> {
    trace!("Executing command: {:?}", cli.command);

    if let Commands::Version = cli.command {
        return print_version(cli.output);
    }

    let (config, config_path) = load_config(cli)?;
    let profile = cli.profile.as_deref();
    let start = std::time::Instant::now();

    let result = match &cli.command {
        Commands::Wait(args) => {
            commands::wait::handle_wait(args, &config, profile, cli.output).await
        }
        Commands::Storage(cmd) => {
            commands::storage::handle_storage(cmd, &config, profile, cli.output).await
        }
        Commands::Profile(cmd) => {
            commands::profile::handle_profile(cmd, &config, &config_path, cli.output).await
        }
        Commands::Config(cmd) => {
            commands::config::handle_config(cmd, &config, &config_path, cli.output)
        }
        Commands::Version => Ok(()),
    };

    info!("Command finished in {:?}", start.elapsed());
    result
}

fn print_version(format: output::OutputFormat) -> Result<(), CliError> {
    match format {
        output::OutputFormat::Table => {
            println!("statewait {}", env!("CARGO_PKG_VERSION"));
        }
        _ => {
            let data = serde_json::json!({
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            });
            output::print_output(data, format)?;
        }
    }
    Ok(())
}
