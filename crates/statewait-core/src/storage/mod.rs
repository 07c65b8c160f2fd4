//! Storage data-plane call sites
//!
//! These are the operations that motivated the poller: creating a share or
//! container right after deleting one with the same name answers `409` until
//! the delete drains, and a freshly created directory is not always visible
//! to the next read.
//!
//! Everything hangs off an explicit [`StorageContext`], built from a
//! [`Profile`] and the polling defaults, instead of shared global clients.

pub mod client;
pub mod containers;
pub mod directories;
pub mod shares;

pub use client::{DataPlaneClient, Service};
pub use containers::{ContainerClient, ContainerProperties, CreateContainerInput};
pub use directories::{DirectoryClient, DirectoryProperties, DirectoryState};
pub use shares::{CreateShareInput, ShareClient, ShareProperties};

use std::fmt;
use std::future::Future;
use tokio::time::Instant;
use tracing::info;

use crate::config::{Config, PollingConfig, Profile};
use crate::error::{CoreError, Result};
use crate::poller::{Observation, StateChangeConf, refresh_fn};

/// User agent string for data-plane requests
const USER_AGENT: &str = concat!("statewait/", env!("CARGO_PKG_VERSION"));

/// Shared wiring for storage call sites
#[derive(Debug, Clone)]
pub struct StorageContext {
    http: reqwest::Client,
    profile: Profile,
    polling: PollingConfig,
}

impl StorageContext {
    pub fn new(profile: Profile, polling: PollingConfig) -> Result<Self> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self::with_client(http, profile, polling))
    }

    pub fn with_client(http: reqwest::Client, profile: Profile, polling: PollingConfig) -> Self {
        Self {
            http,
            profile,
            polling,
        }
    }

    /// Build a context for the selected profile of a configuration
    pub fn from_config(config: &Config, explicit_profile: Option<&str>) -> Result<Self> {
        let (name, profile) = config
            .effective_profile(explicit_profile)
            .map_err(|e| CoreError::Config(e.to_string()))?;
        info!(profile = %name, "Using storage profile");
        let polling = config.polling_for(&profile);
        Self::new(profile, polling)
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn polling(&self) -> &PollingConfig {
        &self.polling
    }

    pub fn data_plane(&self, account: &str, service: Service) -> Result<DataPlaneClient> {
        DataPlaneClient::new(self.http.clone(), &self.profile, account, service)
    }

    pub fn shares(&self, account: &str) -> Result<ShareClient> {
        Ok(ShareClient::new(
            self.data_plane(account, Service::File)?,
            self.polling.clone(),
        ))
    }

    pub fn containers(&self, account: &str) -> Result<ContainerClient> {
        Ok(ContainerClient::new(
            self.data_plane(account, Service::Blob)?,
            self.polling.clone(),
        ))
    }

    pub fn directories(&self, account: &str) -> Result<DirectoryClient> {
        Ok(DirectoryClient::new(
            self.data_plane(account, Service::File)?,
            self.polling.clone(),
        ))
    }
}

/// States of a create that may have to wait for an earlier delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateState {
    WaitingOnDelete,
    Succeeded,
}

impl fmt::Display for CreateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreateState::WaitingOnDelete => f.write_str("waitingOnDelete"),
            CreateState::Succeeded => f.write_str("succeeded"),
        }
    }
}

/// Issue a create; if the name is still held by a delete in progress, keep
/// reissuing it until the delete drains
///
/// A conflict other than `being_deleted_code` while waiting means an earlier
/// attempt in this session already landed, so it counts as success.
pub(crate) async fn create_after_pending_delete<F, Fut>(
    resource: String,
    being_deleted_code: &'static str,
    polling: &PollingConfig,
    deadline: Instant,
    mut create: F,
) -> Result<()>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<()>> + Send,
{
    match create().await {
        Ok(()) => return Ok(()),
        Err(err) if !client::is_conflict_with_code(&err, being_deleted_code) => return Err(err),
        Err(_) => {}
    }

    info!(%resource, code = being_deleted_code, "Previous delete still in progress, waiting");

    let conf = StateChangeConf::new([CreateState::WaitingOnDelete], [CreateState::Succeeded])
        .min_interval(polling.interval())
        .not_found_checks(polling.not_found_checks);

    let refresh = refresh_fn(resource, move || {
        let attempt = create();
        async move {
            match attempt.await {
                Ok(()) => Ok(Observation::found((), CreateState::Succeeded)),
                Err(err) if client::is_conflict_with_code(&err, being_deleted_code) => {
                    Ok(Observation::not_found(CreateState::WaitingOnDelete))
                }
                Err(err) if err.is_conflict() => Ok(Observation::found((), CreateState::Succeeded)),
                Err(err) => Err(err),
            }
        }
    });

    conf.wait_for_state_until(refresh, deadline).await?;
    Ok(())
}
