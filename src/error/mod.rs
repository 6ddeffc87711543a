//! Error types for cloudshell.

use thiserror::Error;

use crate::environment::EnvironmentState;

/// Primary error type for all cloudshell operations.
///
/// Every variant is fatal to the current invocation; the binary reports it
/// and exits with a non-zero status.
#[derive(Error, Debug)]
pub enum CloudShellError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Cloud Shell error {code} ({status}): {message}")]
    Environment {
        code: i32,
        status: String,
        message: String,
    },

    #[error("Cloud Shell is not available (state: {0})")]
    Unavailable(EnvironmentState),

    #[error("Timed out after {polls} polls waiting for Cloud Shell (last state: {last_state})")]
    Timeout {
        polls: u32,
        last_state: EnvironmentState,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl CloudShellError {
    /// Create an environment error from an embedded server error body.
    pub fn environment(code: i32, status: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Environment {
            code,
            status: status.into(),
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::Parse(_) => ErrorCategory::Parse,
            Self::Environment { .. } => ErrorCategory::Environment,
            Self::Unavailable(_) => ErrorCategory::Environment,
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::Network(_) => ErrorCategory::Network,
            Self::Io(_) => ErrorCategory::Io,
            Self::Transport(_) => ErrorCategory::Transport,
        }
    }
}

impl From<serde_json::Error> for CloudShellError {
    fn from(error: serde_json::Error) -> Self {
        Self::Parse(error.to_string())
    }
}

impl From<toml::de::Error> for CloudShellError {
    fn from(error: toml::de::Error) -> Self {
        Self::Configuration(error.to_string())
    }
}

/// Coarse classification used for user-facing help text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Authentication,
    Parse,
    Environment,
    Timeout,
    Network,
    Io,
    Transport,
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, CloudShellError>;
