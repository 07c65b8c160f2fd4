//! Blob containers

use reqwest::Method;
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::time::Instant;
use tracing::debug;

use super::client::{self, DataPlaneClient};
use crate::config::PollingConfig;
use crate::error::Result;

/// Error code returned while a container with the same name is being deleted
pub const CONTAINER_BEING_DELETED: &str = "ContainerBeingDeleted";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateContainerInput {
    pub metadata: BTreeMap<String, String>,
    /// `blob` or `container`; private when unset
    pub access_level: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContainerProperties {
    pub metadata: BTreeMap<String, String>,
    pub access_level: Option<String>,
    pub has_immutability_policy: bool,
    pub has_legal_hold: bool,
}

/// Container operations for one storage account
#[derive(Debug, Clone)]
pub struct ContainerClient {
    client: DataPlaneClient,
    polling: PollingConfig,
}

impl ContainerClient {
    pub fn new(client: DataPlaneClient, polling: PollingConfig) -> Self {
        Self { client, polling }
    }

    /// Create a container, waiting out a delete of the same name if one is in progress
    pub async fn create(
        &self,
        name: &str,
        input: &CreateContainerInput,
        deadline: Instant,
    ) -> Result<()> {
        client::validate_container_name("container", name)?;
        client::validate_metadata(&input.metadata)?;

        super::create_after_pending_delete(
            format!("container \"{name}\""),
            CONTAINER_BEING_DELETED,
            &self.polling,
            deadline,
            || self.create_once(name, input),
        )
        .await
    }

    async fn create_once(&self, name: &str, input: &CreateContainerInput) -> Result<()> {
        let mut request = self
            .client
            .request(Method::PUT, &[name], &[("restype", "container")])?;
        request = client::with_metadata(request, &input.metadata);
        if let Some(level) = &input.access_level {
            request = request.header("x-ms-blob-public-access", level);
        }

        self.client.send(request).await?;
        debug!(container = name, "Created container");
        Ok(())
    }

    pub async fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.get_properties(name).await?.is_some())
    }

    /// Properties of a container, or `None` if it doesn't exist
    pub async fn get_properties(&self, name: &str) -> Result<Option<ContainerProperties>> {
        let request = self
            .client
            .request(Method::GET, &[name], &[("restype", "container")])?;
        let Some(response) = self.client.send_optional(request).await? else {
            return Ok(None);
        };

        let flag = |header: &str| {
            client::header_str(&response, header).is_some_and(|v| v.eq_ignore_ascii_case("true"))
        };

        Ok(Some(ContainerProperties {
            metadata: client::metadata_from(&response),
            access_level: client::header_str(&response, "x-ms-blob-public-access"),
            has_immutability_policy: flag("x-ms-has-immutability-policy"),
            has_legal_hold: flag("x-ms-has-legal-hold"),
        }))
    }

    /// Delete a container; a missing container is not an error
    pub async fn delete(&self, name: &str) -> Result<()> {
        let request = self
            .client
            .request(Method::DELETE, &[name], &[("restype", "container")])?;
        self.client.send_optional(request).await?;
        Ok(())
    }
}
