//! # statewait-core
//!
//! Waiting on remote objects that are eventually consistent.
//!
//! After a mutating request is accepted, the effect is not always observable
//! right away: the object may not be queryable yet, or the name may still be
//! held by a delete that is draining. This crate provides one reusable way of
//! waiting for that, plus the storage call sites that need it.
//!
//! ## Layers
//!
//! - [`poller`] - [`StateChangeConf`] and the [`Refresh`] contract. Callers
//!   supply pending and target states; the poller supplies interval,
//!   deadline and not-found bookkeeping.
//! - [`progress`] - optional callback for per-poll events.
//! - [`storage`] - share, container and directory operations that wait
//!   through the poller.
//! - [`config`] / [`timeouts`] - profiles, polling defaults and per-resource
//!   CRUD budgets.
//!
//! ## Example
//!
//! ```rust,no_run
//! use statewait_core::config::Config;
//! use statewait_core::storage::{CreateShareInput, StorageContext};
//! use statewait_core::timeouts::{Operation, ResourceKind};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load()?;
//! let ctx = StorageContext::from_config(&config, None)?;
//! let deadline = config
//!     .timeouts_for(ResourceKind::StorageShare)
//!     .deadline(Operation::Create);
//!
//! ctx.shares("myaccount")?
//!     .create("logs", &CreateShareInput::default(), deadline)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod poller;
pub mod progress;
pub mod storage;
pub mod timeouts;

pub use config::{Config, ConfigError, PollingConfig, Profile};
pub use error::{CoreError, Result};
pub use poller::{
    Completed, DEFAULT_MIN_INTERVAL, DEFAULT_NOT_FOUND_CHECKS, DEFAULT_TIMEOUT, Observation,
    Refresh, RefreshFn, StateChangeConf, deadline_after, refresh_fn,
};
pub use progress::{PollEvent, ProgressCallback};
pub use timeouts::{Operation, ResourceKind, ResourceTimeouts};
