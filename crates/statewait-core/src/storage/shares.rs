//! File shares

use reqwest::Method;
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::time::Instant;
use tracing::debug;

use super::client::{self, DataPlaneClient};
use crate::config::PollingConfig;
use crate::error::{CoreError, Result};

/// Error code returned while a share with the same name is being deleted
pub const SHARE_BEING_DELETED: &str = "ShareBeingDeleted";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateShareInput {
    pub metadata: BTreeMap<String, String>,
    pub quota_gb: Option<u32>,
    pub access_tier: Option<String>,
    pub enabled_protocol: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShareProperties {
    pub metadata: BTreeMap<String, String>,
    pub quota_gb: Option<u32>,
    pub access_tier: Option<String>,
    pub enabled_protocol: Option<String>,
}

/// Share operations for one storage account
#[derive(Debug, Clone)]
pub struct ShareClient {
    client: DataPlaneClient,
    polling: PollingConfig,
}

impl ShareClient {
    pub fn new(client: DataPlaneClient, polling: PollingConfig) -> Self {
        Self { client, polling }
    }

    /// Create a share, waiting out a delete of the same name if one is in progress
    pub async fn create(
        &self,
        name: &str,
        input: &CreateShareInput,
        deadline: Instant,
    ) -> Result<()> {
        client::validate_container_name("share", name)?;
        client::validate_metadata(&input.metadata)?;

        super::create_after_pending_delete(
            format!("share \"{name}\""),
            SHARE_BEING_DELETED,
            &self.polling,
            deadline,
            || self.create_once(name, input),
        )
        .await
    }

    async fn create_once(&self, name: &str, input: &CreateShareInput) -> Result<()> {
        let mut request = self
            .client
            .request(Method::PUT, &[name], &[("restype", "share")])?;
        request = client::with_metadata(request, &input.metadata);
        if let Some(quota) = input.quota_gb {
            request = request.header("x-ms-share-quota", quota.to_string());
        }
        if let Some(tier) = &input.access_tier {
            request = request.header("x-ms-access-tier", tier);
        }
        if let Some(protocol) = &input.enabled_protocol {
            request = request.header("x-ms-enabled-protocols", protocol);
        }

        self.client.send(request).await?;
        debug!(share = name, "Created share");
        Ok(())
    }

    pub async fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.get_properties(name).await?.is_some())
    }

    /// Properties of a share, or `None` if it doesn't exist
    pub async fn get_properties(&self, name: &str) -> Result<Option<ShareProperties>> {
        let request = self
            .client
            .request(Method::GET, &[name], &[("restype", "share")])?;
        let Some(response) = self.client.send_optional(request).await? else {
            return Ok(None);
        };

        let quota_gb = client::header_str(&response, "x-ms-share-quota")
            .map(|q| {
                q.parse::<u32>()
                    .map_err(|_| CoreError::Validation(format!("invalid share quota '{q}'")))
            })
            .transpose()?;

        Ok(Some(ShareProperties {
            metadata: client::metadata_from(&response),
            quota_gb,
            access_tier: client::header_str(&response, "x-ms-access-tier"),
            enabled_protocol: client::header_str(&response, "x-ms-enabled-protocols"),
        }))
    }

    /// Delete a share and its snapshots; a missing share is not an error
    pub async fn delete(&self, name: &str) -> Result<()> {
        let request = self
            .client
            .request(Method::DELETE, &[name], &[("restype", "share")])?
            .header("x-ms-delete-snapshots", "include");
        self.client.send_optional(request).await?;
        Ok(())
    }
}
