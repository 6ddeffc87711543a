use std::path::PathBuf;

use thiserror::Error;

use crate::error::CloudShellError;

/// Errors raised while obtaining or persisting OAuth credentials.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Credentials file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Cannot parse {}: {message}", path.display())]
    InvalidFile { path: PathBuf, message: String },
    #[error("Cannot write {}: {message}", path.display())]
    Write { path: PathBuf, message: String },
    #[error("Token endpoint rejected the request: {0}")]
    Rejected(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
    #[error("Authorization failed: {0}")]
    Authorization(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("IO error: {0}")]
    Io(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::InvalidResponse(error.to_string())
    }
}

impl From<AuthError> for CloudShellError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::NotFound(_) | AuthError::InvalidFile { .. } | AuthError::Write { .. } => {
                CloudShellError::Configuration(error.to_string())
            }
            AuthError::InvalidResponse(message) => CloudShellError::Parse(message),
            other => CloudShellError::Authentication(other.to_string()),
        }
    }
}
