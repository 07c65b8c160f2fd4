//! `statewait wait`: poll an HTTP endpoint until it answers with a target status

use reqwest::Url;
use serde::Serialize;
use statewait_core::{Config, Observation, PollEvent, Refresh, StateChangeConf};
use std::time::Duration;
use tracing::debug;

use crate::cli::WaitArgs;
use crate::error::{CliError, Result};
use crate::output::{self, OutputFormat};

const USER_AGENT: &str = concat!("statewait/", env!("CARGO_PKG_VERSION"));

/// What the last successful poll saw
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub status: u16,
    pub content_length: Option<u64>,
}

#[derive(Debug, Serialize)]
struct WaitOutcome {
    url: String,
    status: u16,
    attempts: u32,
    elapsed_secs: f64,
    content_length: Option<u64>,
}

/// A GET whose response status code is the polled state
pub struct StatusRefresh {
    client: reqwest::Client,
    url: Url,
    headers: Vec<(String, String)>,
    not_found_status: Vec<u16>,
}

impl StatusRefresh {
    pub fn new(
        client: reqwest::Client,
        url: Url,
        headers: Vec<(String, String)>,
        not_found_status: Vec<u16>,
    ) -> Self {
        Self {
            client,
            url,
            headers,
            not_found_status,
        }
    }
}

impl Refresh for StatusRefresh {
    type Value = StatusSnapshot;
    type State = u16;

    fn name(&self) -> &str {
        self.url.as_str()
    }

    async fn refresh(&mut self) -> statewait_core::Result<Observation<StatusSnapshot, u16>> {
        let mut request = self.client.get(self.url.clone());
        for (name, value) in &self.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        debug!(url = %self.url, status, "Polled");

        if self.not_found_status.contains(&status) {
            return Ok(Observation::not_found(status));
        }
        Ok(Observation::found(
            StatusSnapshot {
                status,
                content_length: response.content_length(),
            },
            status,
        ))
    }
}

pub async fn handle_wait(
    args: &WaitArgs,
    config: &Config,
    profile: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    if let Some(status) = args.pending.iter().find(|s| args.target.contains(s)) {
        return Err(CliError::InvalidInput {
            message: format!("status {status} is both pending and target"),
        });
    }
    let url = Url::parse(&args.url).map_err(|e| CliError::InvalidInput {
        message: format!("invalid URL '{}': {e}", args.url),
    })?;

    // An explicit profile contributes its polling override
    let polling = match profile {
        Some(name) => config.polling_for(config.profile(name)?),
        None => config.polling.clone(),
    };

    let mut conf = StateChangeConf::new(args.pending.clone(), args.target.clone())
        .min_interval(Duration::from_secs(
            args.interval.unwrap_or(polling.interval_secs),
        ))
        .timeout(Duration::from_secs(args.timeout))
        .delay(Duration::from_secs(args.delay))
        .not_found_checks(args.not_found_checks.unwrap_or(polling.not_found_checks))
        .continuous_target_occurrence(args.continuous_target);
    if !args.quiet {
        conf = conf.on_progress(Box::new(print_progress));
    }

    let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
    let refresh = StatusRefresh::new(
        client,
        url,
        args.headers.clone(),
        args.not_found_status.clone(),
    );

    let done = conf.wait_for_state(refresh).await?;

    let outcome = WaitOutcome {
        url: args.url.clone(),
        status: done.state,
        attempts: done.attempts,
        elapsed_secs: done.elapsed.as_secs_f64(),
        content_length: done.value.content_length,
    };
    output::print_output(outcome, format)?;
    Ok(())
}

fn print_progress(event: PollEvent) {
    if let PollEvent::Polling {
        name,
        state,
        attempt,
        elapsed,
    } = event
    {
        eprintln!("{name}: {state} (attempt {attempt}, {elapsed:.1?} elapsed)");
    }
}
