//! CLI-specific error formatting for user-facing messages.

use crate::error::CloudShellError;

/// Map a [`CloudShellError`] to a user-facing help string with actionable guidance.
pub fn format_error_help(err: &CloudShellError) -> String {
    match err {
        CloudShellError::Configuration(msg) => {
            format!("{msg}. Check --client-secrets/--credentials or your config.toml")
        }
        CloudShellError::Authentication(msg) => {
            format!("Authentication failed: {msg}. Run: cloudshell --auth")
        }
        CloudShellError::Environment {
            code,
            status,
            message,
        } if *code == 401 || *code == 403 || status == "PERMISSION_DENIED" => {
            format!(
                "Cloud Shell refused the request ({code} {status}): {message}. \
                 Check --project and that the Cloud Shell API is enabled, or run: cloudshell --auth"
            )
        }
        CloudShellError::Timeout { last_state, .. } => format!(
            "Cloud Shell did not become ready (last state: {last_state}). Try again in a minute"
        ),
        CloudShellError::Unavailable(state) => format!(
            "Cloud Shell is {state}; only a running or disabled environment can be used. \
             Try again in a minute"
        ),
        other => format!("{other}"),
    }
}
