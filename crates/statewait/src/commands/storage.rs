//! `statewait storage`: share, container and directory operations

use serde::Serialize;
use serde_json::{Value, json};
use statewait_core::storage::{CreateContainerInput, CreateShareInput, StorageContext};
use statewait_core::{Config, Operation, ResourceKind, deadline_after};
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

use crate::cli::{ContainerCommands, DirectoryCommands, ShareCommands, StorageCommands};
use crate::error::{CliError, Result};
use crate::output::{self, OutputFormat};

pub async fn handle_storage(
    command: &StorageCommands,
    config: &Config,
    profile: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let (profile_name, profile) = config.effective_profile(profile)?;
    info!(profile = %profile_name, "Using storage profile");
    let polling = config.polling_for(&profile);
    let ctx = StorageContext::new(profile, polling)?;

    let result = match command {
        StorageCommands::Share(cmd) => handle_share(cmd, &ctx, config).await?,
        StorageCommands::Container(cmd) => handle_container(cmd, &ctx, config).await?,
        StorageCommands::Directory(cmd) => handle_directory(cmd, &ctx, config).await?,
    };

    output::print_output(result, format)?;
    Ok(())
}

async fn handle_share(cmd: &ShareCommands, ctx: &StorageContext, config: &Config) -> Result<Value> {
    let kind = ResourceKind::StorageShare;
    match cmd {
        ShareCommands::Create {
            account,
            name,
            metadata,
            quota,
            access_tier,
            enabled_protocol,
            timeout,
        } => {
            let input = CreateShareInput {
                metadata: to_map(metadata),
                quota_gb: *quota,
                access_tier: access_tier.clone(),
                enabled_protocol: enabled_protocol.clone(),
            };
            let deadline = deadline(config, kind, Operation::Create, *timeout);
            ctx.shares(account)?.create(name, &input, deadline).await?;
            Ok(json!({"account": account, "share": name, "status": "created"}))
        }
        ShareCommands::Exists { account, name } => {
            let deadline = deadline(config, kind, Operation::Read, None);
            let shares = ctx.shares(account)?;
            let props = within(deadline, &format!("share \"{name}\""), shares.get_properties(name))
                .await?;
            with_properties(json!({"account": account, "share": name}), props)
        }
        ShareCommands::Delete {
            account,
            name,
            timeout,
        } => {
            let deadline = deadline(config, kind, Operation::Delete, *timeout);
            let shares = ctx.shares(account)?;
            within(deadline, &format!("share \"{name}\""), shares.delete(name)).await?;
            Ok(json!({"account": account, "share": name, "status": "deleted"}))
        }
    }
}

async fn handle_container(
    cmd: &ContainerCommands,
    ctx: &StorageContext,
    config: &Config,
) -> Result<Value> {
    let kind = ResourceKind::StorageContainer;
    match cmd {
        ContainerCommands::Create {
            account,
            name,
            metadata,
            access_level,
            timeout,
        } => {
            let input = CreateContainerInput {
                metadata: to_map(metadata),
                access_level: access_level.clone(),
            };
            let deadline = deadline(config, kind, Operation::Create, *timeout);
            ctx.containers(account)?
                .create(name, &input, deadline)
                .await?;
            Ok(json!({"account": account, "container": name, "status": "created"}))
        }
        ContainerCommands::Exists { account, name } => {
            let deadline = deadline(config, kind, Operation::Read, None);
            let containers = ctx.containers(account)?;
            let props = within(
                deadline,
                &format!("container \"{name}\""),
                containers.get_properties(name),
            )
            .await?;
            with_properties(json!({"account": account, "container": name}), props)
        }
        ContainerCommands::Delete {
            account,
            name,
            timeout,
        } => {
            let deadline = deadline(config, kind, Operation::Delete, *timeout);
            let containers = ctx.containers(account)?;
            within(deadline, &format!("container \"{name}\""), containers.delete(name)).await?;
            Ok(json!({"account": account, "container": name, "status": "deleted"}))
        }
    }
}

async fn handle_directory(
    cmd: &DirectoryCommands,
    ctx: &StorageContext,
    config: &Config,
) -> Result<Value> {
    let kind = ResourceKind::StorageShareDirectory;
    match cmd {
        DirectoryCommands::Create {
            account,
            share,
            path,
            metadata,
            timeout,
        } => {
            let deadline = deadline(config, kind, Operation::Create, *timeout);
            let props = ctx
                .directories(account)?
                .create(share, path, &to_map(metadata), deadline)
                .await?;
            with_properties(
                json!({"account": account, "share": share, "path": path, "status": "created"}),
                Some(props),
            )
        }
        DirectoryCommands::Exists {
            account,
            share,
            path,
        } => {
            let deadline = deadline(config, kind, Operation::Read, None);
            let directories = ctx.directories(account)?;
            let props = within(
                deadline,
                &format!("directory \"{path}\""),
                directories.get_properties(share, path),
            )
            .await?;
            with_properties(json!({"account": account, "share": share, "path": path}), props)
        }
        DirectoryCommands::Delete {
            account,
            share,
            path,
            timeout,
        } => {
            let deadline = deadline(config, kind, Operation::Delete, *timeout);
            let directories = ctx.directories(account)?;
            within(
                deadline,
                &format!("directory \"{path}\""),
                directories.delete(share, path),
            )
            .await?;
            Ok(json!({"account": account, "share": share, "path": path, "status": "deleted"}))
        }
    }
}

/// Deadline for an operation: the `--timeout` override or the configured budget
fn deadline(
    config: &Config,
    kind: ResourceKind,
    operation: Operation,
    override_secs: Option<u64>,
) -> Instant {
    match override_secs {
        Some(secs) => deadline_after(Instant::now(), Duration::from_secs(secs)),
        None => config.timeouts_for(kind).deadline(operation),
    }
}

/// Run a single request under the operation deadline
async fn within<T>(
    deadline: Instant,
    resource: &str,
    fut: impl Future<Output = statewait_core::Result<T>>,
) -> Result<T> {
    match tokio::time::timeout_at(deadline, fut).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(CliError::Timeout {
            message: format!("timeout while waiting for {resource}"),
        }),
    }
}

fn to_map(pairs: &[(String, String)]) -> BTreeMap<String, String> {
    pairs.iter().cloned().collect()
}

/// Merge resource properties into the base output, with an `exists` flag
fn with_properties<T: Serialize>(mut base: Value, props: Option<T>) -> Result<Value> {
    let exists = props.is_some();
    if let Value::Object(out) = &mut base {
        if !out.contains_key("status") {
            out.insert("exists".to_string(), Value::Bool(exists));
        }
        if let Some(props) = props
            && let Value::Object(fields) = serde_json::to_value(props)?
        {
            out.extend(fields);
        }
    }
    Ok(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use statewait_core::storage::ShareProperties;

    #[test]
    fn test_with_properties_missing() {
        let out = with_properties::<ShareProperties>(json!({"share": "logs"}), None).unwrap();
        assert_eq!(out, json!({"share": "logs", "exists": false}));
    }

    #[test]
    fn test_with_properties_flattens_fields() {
        let props = ShareProperties {
            quota_gb: Some(5),
            ..Default::default()
        };
        let out = with_properties(json!({"share": "logs"}), Some(props)).unwrap();
        assert_eq!(out["exists"], json!(true));
        assert_eq!(out["quota_gb"], json!(5));
        assert_eq!(out["metadata"], json!({}));
    }

    #[test]
    fn test_deadline_override() {
        let config = Config::default();
        let before = Instant::now();
        let d = deadline(
            &config,
            ResourceKind::StorageShare,
            Operation::Create,
            Some(5),
        );
        assert!(d >= before + Duration::from_secs(5));
        assert!(d < before + Duration::from_secs(60));
    }

    #[test]
    fn test_deadline_override_u64_max_is_clamped() {
        let config = Config::default();
        let before = Instant::now();
        let d = deadline(
            &config,
            ResourceKind::StorageShare,
            Operation::Delete,
            Some(u64::MAX),
        );
        assert!(d > before + Duration::from_secs(86400 * 365));
    }

    #[test]
    fn test_to_map_last_value_wins() {
        let pairs = vec![
            ("a".to_string(), "1".to_string()),
            ("a".to_string(), "2".to_string()),
        ];
        assert_eq!(to_map(&pairs).get("a").map(String::as_str), Some("2"));
    }
}
