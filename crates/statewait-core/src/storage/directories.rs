//! File share directories
//!
//! A directory that was just created is not always visible to the next
//! read, so creation waits until it has been seen several times in a row.

use reqwest::Method;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tokio::time::Instant;
use tracing::debug;

use super::client::{self, DataPlaneClient};
use crate::config::PollingConfig;
use crate::error::{CoreError, Result};
use crate::poller::{Observation, Refresh, StateChangeConf};

/// Visibility of a directory, labelled with the status code that reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryState {
    NotFound,
    Available,
}

impl fmt::Display for DirectoryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectoryState::NotFound => f.write_str("404"),
            DirectoryState::Available => f.write_str("200"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DirectoryProperties {
    pub metadata: BTreeMap<String, String>,
}

/// Directory operations for one storage account
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    client: DataPlaneClient,
    polling: PollingConfig,
}

impl DirectoryClient {
    pub fn new(client: DataPlaneClient, polling: PollingConfig) -> Self {
        Self { client, polling }
    }

    /// Create a directory and wait for it to become consistently visible
    ///
    /// Fails with [`CoreError::AlreadyExists`] if the path is already taken.
    pub async fn create(
        &self,
        share: &str,
        path: &str,
        metadata: &BTreeMap<String, String>,
        deadline: Instant,
    ) -> Result<DirectoryProperties> {
        client::validate_container_name("share", share)?;
        validate_directory_path(path)?;
        client::validate_metadata(metadata)?;

        let resource = format!("directory \"{path}\" (share \"{share}\")");
        if self.get_properties(share, path).await?.is_some() {
            return Err(CoreError::AlreadyExists { resource });
        }

        let request = self
            .client
            .request(Method::PUT, &[share, path], &[("restype", "directory")])?;
        self.client
            .send(client::with_metadata(request, metadata))
            .await?;
        debug!(share, path, "Created directory, waiting for it to become available");

        let conf = StateChangeConf::new([DirectoryState::NotFound], [DirectoryState::Available])
            .min_interval(self.polling.interval())
            .not_found_checks(self.polling.not_found_checks)
            .continuous_target_occurrence(self.polling.continuous_target_occurrence);

        let refresh = DirectoryRefresh {
            directories: self,
            share,
            path,
            resource,
        };
        let done = conf.wait_for_state_until(refresh, deadline).await?;
        Ok(done.value)
    }

    pub async fn exists(&self, share: &str, path: &str) -> Result<bool> {
        Ok(self.get_properties(share, path).await?.is_some())
    }

    /// Properties of a directory, or `None` if it doesn't exist
    pub async fn get_properties(
        &self,
        share: &str,
        path: &str,
    ) -> Result<Option<DirectoryProperties>> {
        let request = self
            .client
            .request(Method::GET, &[share, path], &[("restype", "directory")])?;
        Ok(self
            .client
            .send_optional(request)
            .await?
            .map(|response| DirectoryProperties {
                metadata: client::metadata_from(&response),
            }))
    }

    /// Delete an empty directory; a missing directory is not an error
    pub async fn delete(&self, share: &str, path: &str) -> Result<()> {
        let request = self
            .client
            .request(Method::DELETE, &[share, path], &[("restype", "directory")])?;
        self.client.send_optional(request).await?;
        Ok(())
    }
}

struct DirectoryRefresh<'a> {
    directories: &'a DirectoryClient,
    share: &'a str,
    path: &'a str,
    resource: String,
}

impl Refresh for DirectoryRefresh<'_> {
    type Value = DirectoryProperties;
    type State = DirectoryState;

    fn name(&self) -> &str {
        &self.resource
    }

    async fn refresh(&mut self) -> Result<Observation<DirectoryProperties, DirectoryState>> {
        Ok(
            match self.directories.get_properties(self.share, self.path).await? {
                Some(props) => Observation::found(props, DirectoryState::Available),
                None => Observation::not_found(DirectoryState::NotFound),
            },
        )
    }
}

/// Directory paths are `/`-separated names without empty or dot segments
fn validate_directory_path(path: &str) -> Result<()> {
    let invalid = path.is_empty()
        || path.len() > 2048
        || path
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        || path.chars().any(|c| matches!(c, '\\' | ':' | '|' | '<' | '>' | '*' | '?' | '"'));
    if invalid {
        return Err(CoreError::Validation(format!(
            "directory path '{path}' is not valid"
        )));
    }
    Ok(())
}
