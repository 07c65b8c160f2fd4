//! Eventually-consistent state poller
//!
//! Remote object creation is frequently not linearizable with the call that
//! started it: the service accepts the request before the object is
//! queryable, or briefly answers with a conflict while an earlier delete
//! drains. [`StateChangeConf`] separates "what counts as done" (caller
//! supplied pending/target states) from "how to wait" (interval, deadline,
//! bounded not-found checks).
//!
//! # Example
//!
//! ```rust,no_run
//! use statewait_core::{CoreError, Observation, StateChangeConf, refresh_fn};
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), CoreError> {
//! let conf = StateChangeConf::new(["404"], ["200"])
//!     .min_interval(Duration::from_secs(10))
//!     .timeout(Duration::from_secs(60));
//!
//! let done = conf
//!     .wait_for_state(refresh_fn("directory \"logs\"", || async {
//!         // issue a GET and classify the status code here
//!         Ok::<_, CoreError>(Observation::found((), "200"))
//!     }))
//!     .await?;
//!
//! println!("settled after {} attempts", done.attempts);
//! # Ok(())
//! # }
//! ```

use crate::error::{CoreError, Result};
use crate::progress::{PollEvent, ProgressCallback, emit};
use std::fmt::{self, Debug, Display};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, trace, warn};

/// Default minimum spacing between two invocations (10 seconds)
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(10);

/// Default overall budget for a session (30 minutes)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Not-found checks tolerated by the storage call sites (~30 minutes at 10s)
pub const DEFAULT_NOT_FOUND_CHECKS: u32 = 180;

/// Stand-in for "no deadline" when a duration doesn't fit in an `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// `start + duration`, clamped to roughly 30 years out instead of overflowing
pub fn deadline_after(start: Instant, duration: Duration) -> Instant {
    start
        .checked_add(duration)
        .unwrap_or_else(|| start + FAR_FUTURE)
}

/// Result of one successful status check
///
/// An observation without a value is the distinguished "not found"
/// observation: it is counted against [`StateChangeConf::not_found_checks`]
/// and never completes a session.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation<T, S> {
    pub value: Option<T>,
    pub state: S,
}

impl<T, S> Observation<T, S> {
    /// The object is visible and reports `state`
    pub fn found(value: T, state: S) -> Self {
        Self {
            value: Some(value),
            state,
        }
    }

    /// The object is not visible (yet)
    pub fn not_found(state: S) -> Self {
        Self { value: None, state }
    }

    pub fn is_not_found(&self) -> bool {
        self.value.is_none()
    }
}

/// Successful end of a poll session
#[derive(Debug, Clone, PartialEq)]
pub struct Completed<T, S> {
    /// Payload of the last observation
    pub value: T,
    /// The target state that ended the session
    pub state: S,
    /// Number of invocations of the operation
    pub attempts: u32,
    /// Time from session start to completion
    pub elapsed: Duration,
}

/// A named, idempotent status check
///
/// Implementations must be safe to call repeatedly. Call sites usually
/// implement this on a small struct holding their client and the resource
/// they wait on; [`refresh_fn`] covers one-off closures.
pub trait Refresh: Send {
    type Value: Send;
    type State: Send;

    /// Human readable name of the resource being waited on
    fn name(&self) -> &str;

    /// Perform one status check
    fn refresh(
        &mut self,
    ) -> impl Future<Output = Result<Observation<Self::Value, Self::State>>> + Send;
}

/// [`Refresh`] implementation backed by a closure
pub struct RefreshFn<F> {
    name: String,
    f: F,
}

/// Wrap a closure returning a future as a named [`Refresh`]
pub fn refresh_fn<F, Fut, T, S>(name: impl Into<String>, f: F) -> RefreshFn<F>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<Observation<T, S>>> + Send,
{
    RefreshFn {
        name: name.into(),
        f,
    }
}

impl<F, Fut, T, S> Refresh for RefreshFn<F>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<Observation<T, S>>> + Send,
    T: Send,
    S: Send,
{
    type Value = T;
    type State = S;

    fn name(&self) -> &str {
        &self.name
    }

    fn refresh(&mut self) -> impl Future<Output = Result<Observation<T, S>>> + Send {
        (self.f)()
    }
}

/// Configuration for one poll session
///
/// Immutable once built; a single configuration may drive any number of
/// concurrent sessions since every session keeps its own counters.
pub struct StateChangeConf<S> {
    /// States that mean "try again"
    pub pending: Vec<S>,
    /// States that mean "done"
    pub target: Vec<S>,
    /// Wait before the first invocation
    pub delay: Duration,
    /// Minimum time between the start of two invocations
    pub min_interval: Duration,
    /// Overall budget used by [`StateChangeConf::wait_for_state`]
    pub timeout: Duration,
    /// Consecutive not-found observations tolerated; `None` means only the
    /// deadline bounds them
    pub not_found_checks: Option<u32>,
    /// Consecutive target observations required before success
    pub continuous_target_occurrence: u32,
    on_progress: Option<ProgressCallback>,
}

impl<S: Debug> Debug for StateChangeConf<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateChangeConf")
            .field("pending", &self.pending)
            .field("target", &self.target)
            .field("delay", &self.delay)
            .field("min_interval", &self.min_interval)
            .field("timeout", &self.timeout)
            .field("not_found_checks", &self.not_found_checks)
            .field(
                "continuous_target_occurrence",
                &self.continuous_target_occurrence,
            )
            .finish_non_exhaustive()
    }
}

impl<S> StateChangeConf<S>
where
    S: PartialEq + Clone + Display + Debug + Send + Sync,
{
    /// Create a configuration with the default interval and timeout
    pub fn new(
        pending: impl IntoIterator<Item = S>,
        target: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            pending: pending.into_iter().collect(),
            target: target.into_iter().collect(),
            delay: Duration::ZERO,
            min_interval: DEFAULT_MIN_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            not_found_checks: None,
            continuous_target_occurrence: 1,
            on_progress: None,
        }
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn not_found_checks(mut self, checks: u32) -> Self {
        self.not_found_checks = Some(checks);
        self
    }

    /// Values below 1 are treated as 1
    pub fn continuous_target_occurrence(mut self, occurrences: u32) -> Self {
        self.continuous_target_occurrence = occurrences.max(1);
        self
    }

    pub fn on_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    /// Poll until a target state is reached, with a deadline of now + `timeout`
    pub async fn wait_for_state<R>(&self, refresh: R) -> Result<Completed<R::Value, S>>
    where
        R: Refresh<State = S>,
    {
        let deadline = deadline_after(Instant::now(), self.timeout);
        self.wait_for_state_until(refresh, deadline).await
    }

    /// Poll until a target state is reached or `deadline` passes
    ///
    /// The first invocation always happens, even if the deadline has already
    /// passed. After that no invocation is issued once the deadline is
    /// reached.
    pub async fn wait_for_state_until<R>(
        &self,
        mut refresh: R,
        deadline: Instant,
    ) -> Result<Completed<R::Value, S>>
    where
        R: Refresh<State = S>,
    {
        let name = refresh.name().to_string();
        let start = Instant::now();
        let budget = deadline.saturating_duration_since(start);

        debug!(
            resource = %name,
            pending = ?self.pending,
            target = ?self.target,
            ?budget,
            "Waiting for state"
        );
        emit(&self.on_progress, PollEvent::Started { name: name.clone() });

        if !self.delay.is_zero() {
            sleep_until(deadline_after(start, self.delay).min(deadline)).await;
        }

        let mut attempts = 0u32;
        let mut not_found = 0u32;
        let mut targets_seen = 0u32;
        let mut last_state: Option<S> = None;

        loop {
            let invoked_at = Instant::now();
            attempts += 1;

            let Observation { value, state } = match refresh.refresh().await {
                Ok(observation) => observation,
                Err(err) => return Err(self.fail(&name, err)),
            };

            trace!(resource = %name, %state, attempt = attempts, "Refreshed");
            emit(
                &self.on_progress,
                PollEvent::Polling {
                    name: name.clone(),
                    state: state.to_string(),
                    attempt: attempts,
                    elapsed: start.elapsed(),
                },
            );

            let is_target = self.target.contains(&state);
            if !is_target && !self.pending.contains(&state) {
                let err = CoreError::UnexpectedState {
                    resource: name.clone(),
                    state: state.to_string(),
                    expected: self.expected(),
                };
                return Err(self.fail(&name, err));
            }

            match value {
                None => {
                    targets_seen = 0;
                    not_found += 1;
                    if let Some(limit) = self.not_found_checks
                        && not_found > limit
                    {
                        let err = CoreError::NotFoundLimitExceeded {
                            resource: name.clone(),
                            checks: not_found,
                        };
                        return Err(self.fail(&name, err));
                    }
                }
                Some(value) if is_target => {
                    not_found = 0;
                    targets_seen += 1;
                    if targets_seen >= self.continuous_target_occurrence {
                        let elapsed = start.elapsed();
                        info!(resource = %name, %state, attempts, ?elapsed, "Reached target state");
                        emit(
                            &self.on_progress,
                            PollEvent::Completed {
                                name: name.clone(),
                                state: state.to_string(),
                                attempts,
                                elapsed,
                            },
                        );
                        return Ok(Completed {
                            value,
                            state,
                            attempts,
                            elapsed,
                        });
                    }
                }
                Some(_) => {
                    not_found = 0;
                    targets_seen = 0;
                }
            }
            last_state = Some(state);

            sleep_until(deadline_after(invoked_at, self.min_interval).min(deadline)).await;

            if Instant::now() >= deadline {
                let err = CoreError::Timeout {
                    resource: name.clone(),
                    last_state: last_state
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_default(),
                    expected: self.expected(),
                    timeout: budget,
                };
                return Err(self.fail(&name, err));
            }
        }
    }

    fn expected(&self) -> String {
        self.target
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn fail(&self, name: &str, err: CoreError) -> CoreError {
        warn!(resource = %name, error = %err, "Stopped waiting");
        emit(
            &self.on_progress,
            PollEvent::Failed {
                name: name.to_string(),
                error: err.to_string(),
            },
        );
        err
    }
}
