//! Error types for the statewait CLI
//!
//! Library errors are mapped into [`CliError`] so every failure can be shown
//! as a diagnostic with suggestions for the user.

use colored::Colorize;
use statewait_core::{ConfigError, CoreError};
use thiserror::Error;

/// Cargo-style diagnostic formatter for CLI errors.
///
/// Produces structured output like:
/// ```text
/// error: timeout while waiting for share "logs" to become 'succeeded'
///
///   tip: raise the budget with --timeout <secs>
/// ```
pub struct CliDiagnostic {
    message: String,
    detail: Option<String>,
    tips: Vec<String>,
}

impl CliDiagnostic {
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            detail: None,
            tips: Vec::new(),
        }
    }

    pub fn detail(mut self, text: &str) -> Self {
        self.detail = Some(text.to_string());
        self
    }

    pub fn tip(mut self, description: &str) -> Self {
        self.tips.push(description.to_string());
        self
    }

    /// Print the diagnostic to stderr with colored formatting.
    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        if let Some(detail) = &self.detail {
            eprintln!("  {}", detail);
        }

        for description in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", description);
        }
    }
}

/// Main error type for the statewait binary
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("No profile selected: {message}")]
    NoProfileSelected { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("{message}")]
    Timeout { message: String },

    #[error("{message}")]
    NotFoundLimit { message: String },

    #[error("{message}")]
    UnexpectedState { message: String },

    #[error("{message}")]
    AlreadyExists { message: String },

    #[error("{message}")]
    ApiError { status: u16, message: String },

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error("Output formatting error: {message}")]
    OutputError { message: String },
}

pub type Result<T> = std::result::Result<T, CliError>;

impl CliError {
    /// Get helpful suggestions for resolving this error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            CliError::ProfileNotFound { name } => vec![
                "List available profiles: statewait profile list".to_string(),
                format!("Create profile '{name}': statewait profile set {name}"),
            ],
            CliError::NoProfileSelected { .. } => vec![
                "Pick one with --profile <name> or STATEWAIT_PROFILE".to_string(),
                "Set a default: statewait profile set <name> --default".to_string(),
            ],
            CliError::Timeout { .. } => vec![
                "Raise the budget with --timeout <secs>".to_string(),
                "Check that the resource is actually converging (run with -vv to see each poll)"
                    .to_string(),
            ],
            CliError::NotFoundLimit { .. } => vec![
                "Raise the limit with --not-found-checks or [polling] not_found_checks".to_string(),
            ],
            CliError::UnexpectedState { .. } => vec![
                "Add the state to --pending if it is transient, or to --target if it means success"
                    .to_string(),
            ],
            CliError::ApiError { status: 401 | 403, .. } => vec![
                "Check the bearer or SAS token of the profile: statewait config show".to_string(),
            ],
            CliError::ConnectionError { .. } => vec![
                "Check network connectivity".to_string(),
                "Verify the endpoint settings of the profile: statewait config show".to_string(),
            ],
            CliError::InvalidInput { .. } => {
                vec!["Check the command syntax: statewait <command> --help".to_string()]
            }
            _ => vec![],
        }
    }

    /// Print a cargo-style diagnostic to stderr using colored formatting.
    pub fn print_diagnostic(&self) {
        let mut diag = CliDiagnostic::error(&self.to_string());
        if let CliError::ApiError { status, .. } = self {
            diag = diag.detail(&format!("HTTP status {status}"));
        }

        for suggestion in self.suggestions() {
            diag = diag.tip(&suggestion);
        }

        diag.print();
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Timeout { .. } => CliError::Timeout {
                message: err.to_string(),
            },
            CoreError::NotFoundLimitExceeded { .. } => CliError::NotFoundLimit {
                message: err.to_string(),
            },
            CoreError::UnexpectedState { .. } => CliError::UnexpectedState {
                message: err.to_string(),
            },
            CoreError::AlreadyExists { .. } => CliError::AlreadyExists {
                message: err.to_string(),
            },
            CoreError::Api { status, .. } => CliError::ApiError {
                status,
                message: err.to_string(),
            },
            CoreError::Http(e) => CliError::ConnectionError {
                message: e.to_string(),
            },
            CoreError::Url(e) => CliError::InvalidInput {
                message: e.to_string(),
            },
            CoreError::Validation(message) => CliError::InvalidInput { message },
            CoreError::Config(message) => CliError::Config(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ProfileNotFound { name } => CliError::ProfileNotFound { name },
            ConfigError::NoProfileSelected { suggestion } => {
                CliError::NoProfileSelected { message: suggestion }
            }
            other => CliError::Config(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::OutputError {
            message: format!("{err:#}"),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::OutputError {
            message: format!("JSON error: {err}"),
        }
    }
}

impl From<reqwest::Error> for CliError {
    fn from(err: reqwest::Error) -> Self {
        CliError::ConnectionError {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_core_timeout_maps_to_timeout() {
        let err: CliError = CoreError::Timeout {
            resource: "share \"logs\"".to_string(),
            last_state: "waitingOnDelete".to_string(),
            expected: "succeeded".to_string(),
            timeout: Duration::from_secs(60),
        }
        .into();

        assert!(matches!(err, CliError::Timeout { .. }));
        assert!(err.to_string().contains("waitingOnDelete"));
        assert!(!err.suggestions().is_empty());
    }

    #[test]
    fn test_core_api_error_keeps_status() {
        let err: CliError = CoreError::Api {
            status: 403,
            code: Some("AuthorizationFailure".to_string()),
            message: "denied".to_string(),
        }
        .into();

        match &err {
            CliError::ApiError { status, message } => {
                assert_eq!(*status, 403);
                assert!(message.contains("AuthorizationFailure"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.suggestions().len(), 1);
    }

    #[test]
    fn test_config_profile_not_found() {
        let err: CliError = ConfigError::ProfileNotFound {
            name: "prod".to_string(),
        }
        .into();

        assert_eq!(err.to_string(), "Profile 'prod' not found");
        assert!(err.suggestions()[1].contains("statewait profile set prod"));
    }

    #[test]
    fn test_validation_is_invalid_input() {
        let err: CliError = CoreError::Validation("bad name".to_string()).into();
        assert!(matches!(err, CliError::InvalidInput { .. }));
    }
}
