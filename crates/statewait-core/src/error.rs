//! Unified error handling for statewait-core
//!
//! Covers the three ways a poll session can end badly (unexpected state,
//! deadline exceeded, not-found limit exceeded) alongside the data-plane
//! failures raised by the storage call sites.
//!
//! # Example
//!
//! ```rust
//! use statewait_core::CoreError;
//! use std::time::Duration;
//!
//! fn handle_error(err: CoreError) {
//!     if err.is_timeout() {
//!         println!("Gave up waiting");
//!     } else if err.is_retryable() {
//!         println!("Temporary error, the whole sequence can be reissued");
//!     }
//! }
//!
//! let err = CoreError::Timeout {
//!     resource: "share \"logs\"".to_string(),
//!     last_state: "waitingOnDelete".to_string(),
//!     expected: "succeeded".to_string(),
//!     timeout: Duration::from_secs(60),
//! };
//! assert!(err.is_timeout());
//! ```

use std::time::Duration;
use thiserror::Error;

/// Core error type for polling and data-plane operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// The operation reported a state that is neither pending nor target
    #[error("unexpected state '{state}' for {resource}, wanted target '{expected}'")]
    UnexpectedState {
        resource: String,
        state: String,
        expected: String,
    },

    /// The deadline passed while the resource was still pending
    #[error(
        "timeout while waiting for {resource} to become '{expected}' (last state: '{last_state}', timeout: {timeout:?})"
    )]
    Timeout {
        resource: String,
        last_state: String,
        expected: String,
        timeout: Duration,
    },

    /// The resource was reported missing more times than allowed
    #[error("couldn't find {resource} ({checks} consecutive not-found checks)")]
    NotFoundLimitExceeded { resource: String, checks: u32 },

    /// Non-success response from a data-plane endpoint
    #[error("API error ({status}{}): {message}", .code.as_deref().map(|c| format!(", {c}")).unwrap_or_default())]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// Create was asked for a resource that is already there
    #[error("{resource} already exists")]
    AlreadyExists { resource: String },

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A data-plane URL could not be built
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Validation error (e.g., malformed names)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Returns true if this is a "not found" API error (404)
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::Api { status: 404, .. })
    }

    /// Returns true if this is a conflict API error (409)
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, CoreError::Api { status: 409, .. })
    }

    /// Returns true if a create found the resource already present
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, CoreError::AlreadyExists { .. })
    }

    /// Returns true if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        match self {
            CoreError::Api { status, .. } => *status >= 500,
            CoreError::Http(e) => e.status().is_some_and(|s| s.is_server_error()),
            _ => false,
        }
    }

    /// Returns true if this is a timeout, either of a poll session or of a request
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            CoreError::Timeout { .. } => true,
            CoreError::Http(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Returns true if a poll session saw a state it did not recognize
    #[must_use]
    pub fn is_unexpected_state(&self) -> bool {
        matches!(self, CoreError::UnexpectedState { .. })
    }

    /// Returns true if a poll session gave up because the resource never appeared
    #[must_use]
    pub fn is_not_found_limit(&self) -> bool {
        matches!(self, CoreError::NotFoundLimitExceeded { .. })
    }

    /// Returns true if this error is potentially retryable by reissuing the
    /// whole create/poll sequence
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            CoreError::Api { status, .. } => *status == 429 || *status >= 500,
            CoreError::Http(e) => e.is_timeout() || e.is_connect(),
            CoreError::Timeout { .. } => true,
            _ => false,
        }
    }

    /// The service error code of an API error, if the service supplied one
    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        match self {
            CoreError::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16, code: Option<&str>) -> CoreError {
        CoreError::Api {
            status,
            code: code.map(str::to_string),
            message: "boom".to_string(),
        }
    }

    #[test]
    fn test_api_error_classification() {
        assert!(api(404, None).is_not_found());
        assert!(!api(404, None).is_conflict());
        assert!(api(409, Some("ShareBeingDeleted")).is_conflict());
        assert!(api(503, None).is_server_error());
        assert!(api(503, None).is_retryable());
        assert!(api(429, None).is_retryable());
        assert!(!api(400, None).is_retryable());
    }

    #[test]
    fn test_error_code() {
        assert_eq!(
            api(409, Some("ContainerBeingDeleted")).error_code(),
            Some("ContainerBeingDeleted")
        );
        assert_eq!(api(500, None).error_code(), None);
        assert_eq!(CoreError::Validation("x".to_string()).error_code(), None);
    }

    #[test]
    fn test_poll_error_classification() {
        let timeout = CoreError::Timeout {
            resource: "directory".to_string(),
            last_state: "404".to_string(),
            expected: "200".to_string(),
            timeout: Duration::from_secs(60),
        };
        assert!(timeout.is_timeout());
        assert!(timeout.is_retryable());
        assert!(!timeout.is_not_found());

        let unexpected = CoreError::UnexpectedState {
            resource: "directory".to_string(),
            state: "500".to_string(),
            expected: "200".to_string(),
        };
        assert!(unexpected.is_unexpected_state());
        assert!(!unexpected.is_retryable());

        let never = CoreError::NotFoundLimitExceeded {
            resource: "share".to_string(),
            checks: 181,
        };
        assert!(never.is_not_found_limit());
        assert!(!never.is_timeout());
    }

    #[test]
    fn test_core_error_display() {
        let err = api(409, Some("ShareBeingDeleted"));
        assert_eq!(err.to_string(), "API error (409, ShareBeingDeleted): boom");

        let err = api(500, None);
        assert_eq!(err.to_string(), "API error (500): boom");

        let never = CoreError::NotFoundLimitExceeded {
            resource: "share \"logs\"".to_string(),
            checks: 3,
        };
        assert!(never.to_string().contains("3 consecutive not-found checks"));
    }
}
