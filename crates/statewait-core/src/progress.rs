//! Progress tracking for poll sessions
//!
//! A poll session can run for many minutes while a remote object settles.
//! Callers that want to surface that (spinners, log lines) register a
//! callback on the [`StateChangeConf`](crate::StateChangeConf); everyone else
//! just gets the `tracing` output.

use std::time::Duration;

/// Progress events emitted during a poll session
#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    /// Session has started; no invocation has happened yet
    Started { name: String },
    /// One invocation returned a classified state
    Polling {
        name: String,
        state: String,
        attempt: u32,
        elapsed: Duration,
    },
    /// Session reached a target state
    Completed {
        name: String,
        state: String,
        attempts: u32,
        elapsed: Duration,
    },
    /// Session ended with an error
    Failed { name: String, error: String },
}

/// Callback type for progress updates
///
/// The CLI uses this for verbose status lines. Library callers usually don't
/// need it.
pub type ProgressCallback = Box<dyn Fn(PollEvent) + Send + Sync>;

/// Helper to emit progress events
pub(crate) fn emit(callback: &Option<ProgressCallback>, event: PollEvent) {
    if let Some(cb) = callback {
        cb(event);
    }
}
