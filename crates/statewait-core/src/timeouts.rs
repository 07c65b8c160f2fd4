//! Per-resource CRUD timeouts
//!
//! Every create/read/update/delete gets an overall budget, and the poll
//! sessions started inside it inherit the resulting deadline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

use crate::poller::deadline_after;

/// Kinds of remote resources with known timeout defaults
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    StorageShare,
    StorageContainer,
    StorageShareDirectory,
    StorageQueue,
    DataDiskAttachment,
    OpenShiftCluster,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::StorageShare,
        ResourceKind::StorageContainer,
        ResourceKind::StorageShareDirectory,
        ResourceKind::StorageQueue,
        ResourceKind::DataDiskAttachment,
        ResourceKind::OpenShiftCluster,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::StorageShare => "storage_share",
            ResourceKind::StorageContainer => "storage_container",
            ResourceKind::StorageShareDirectory => "storage_share_directory",
            ResourceKind::StorageQueue => "storage_queue",
            ResourceKind::DataDiskAttachment => "data_disk_attachment",
            ResourceKind::OpenShiftCluster => "open_shift_cluster",
        }
    }

    /// Built-in timeouts for this kind
    pub fn default_timeouts(&self) -> ResourceTimeouts {
        match self {
            ResourceKind::OpenShiftCluster => ResourceTimeouts {
                create: minutes(90),
                read: minutes(5),
                update: minutes(90),
                delete: minutes(90),
            },
            _ => ResourceTimeouts::default(),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CRUD operation a deadline is derived for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

/// Overall budget for each CRUD operation of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResourceTimeouts {
    pub create: Duration,
    pub read: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for ResourceTimeouts {
    fn default() -> Self {
        Self {
            create: minutes(30),
            read: minutes(5),
            update: minutes(30),
            delete: minutes(30),
        }
    }
}

impl ResourceTimeouts {
    pub fn for_operation(&self, operation: Operation) -> Duration {
        match operation {
            Operation::Create => self.create,
            Operation::Read => self.read,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
        }
    }

    /// Deadline for an operation starting now
    pub fn deadline(&self, operation: Operation) -> Instant {
        deadline_after(Instant::now(), self.for_operation(operation))
    }

    /// Apply the fields set in a configuration override
    pub fn merge(mut self, overrides: &TimeoutOverrides) -> Self {
        if let Some(secs) = overrides.create_secs {
            self.create = Duration::from_secs(secs);
        }
        if let Some(secs) = overrides.read_secs {
            self.read = Duration::from_secs(secs);
        }
        if let Some(secs) = overrides.update_secs {
            self.update = Duration::from_secs(secs);
        }
        if let Some(secs) = overrides.delete_secs {
            self.delete = Duration::from_secs(secs);
        }
        self
    }
}

/// Timeout overrides as written in the configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeoutOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_secs: Option<u64>,
}

const fn minutes(n: u64) -> Duration {
    Duration::from_secs(n * 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let share = ResourceKind::StorageShare.default_timeouts();
        assert_eq!(share.create, Duration::from_secs(1800));
        assert_eq!(share.read, Duration::from_secs(300));

        let cluster = ResourceKind::OpenShiftCluster.default_timeouts();
        assert_eq!(cluster.for_operation(Operation::Delete), Duration::from_secs(5400));
        assert_eq!(cluster.for_operation(Operation::Read), Duration::from_secs(300));
    }

    #[test]
    fn test_merge_only_touches_set_fields() {
        let overrides = TimeoutOverrides {
            create_secs: Some(60),
            ..Default::default()
        };
        let merged = ResourceKind::StorageQueue.default_timeouts().merge(&overrides);
        assert_eq!(merged.create, Duration::from_secs(60));
        assert_eq!(merged.update, Duration::from_secs(1800));
    }

    #[test]
    fn test_kind_names_round_trip_through_serde() {
        for kind in ResourceKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline() {
        let now = Instant::now();
        let deadline = ResourceTimeouts::default().deadline(Operation::Read);
        assert_eq!(deadline - now, Duration::from_secs(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_with_huge_override_is_clamped() {
        let now = Instant::now();
        let timeouts = ResourceTimeouts::default().merge(&TimeoutOverrides {
            delete_secs: Some(u64::MAX),
            ..Default::default()
        });
        let deadline = timeouts.deadline(Operation::Delete);
        assert!(deadline > now + Duration::from_secs(86400 * 365));
    }
}
