//! Hand-off from a running environment to the operator's chosen tool.

mod info;
mod ssh;

pub use info::InfoDispatcher;
pub use ssh::{ScpDispatcher, SshDispatcher, Transfer};

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::environment::{EnvironmentDescriptor, SshTarget};
use crate::error::{CloudShellError, Result};

/// Private key `gcloud` provisions for Compute Engine and Cloud Shell.
pub const GOOGLE_COMPUTE_ENGINE_KEY: &str = "google_compute_engine";

/// What the orchestrator hands a transport.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub environment: EnvironmentDescriptor,
}

impl Session {
    pub fn new(access_token: impl Into<String>, environment: EnvironmentDescriptor) -> Self {
        Self {
            access_token: access_token.into(),
            environment,
        }
    }

    /// Connection details; an error unless the environment is running.
    pub fn ssh_target(&self) -> Result<SshTarget> {
        self.environment.ssh_target().ok_or_else(|| {
            CloudShellError::Transport(format!(
                "Cloud Shell is not running (state: {})",
                self.environment.state
            ))
        })
    }
}

#[async_trait]
pub trait TransportDispatcher: Send + Sync {
    async fn dispatch(&self, session: &Session) -> Result<()>;
}

/// `~/.ssh/google_compute_engine`.
pub fn default_key_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| {
        dirs.home_dir()
            .join(".ssh")
            .join(GOOGLE_COMPUTE_ENGINE_KEY)
    })
}

fn require_key(key: &Path) -> Result<()> {
    if key.is_file() {
        Ok(())
    } else {
        Err(CloudShellError::Configuration(format!(
            "SSH key {} not found; run `gcloud cloud-shell ssh` once to create it",
            key.display()
        )))
    }
}

fn locate(program: &str) -> Result<PathBuf> {
    which::which(program).map_err(|_| {
        CloudShellError::Configuration(format!("`{program}` was not found on PATH"))
    })
}

/// Run `program` with inherited stdio and wait for it.
async fn run(program: &str, args: Vec<OsString>) -> Result<()> {
    let binary = locate(program)?;
    tracing::debug!(program = %binary.display(), ?args, "spawning transport");
    let status = tokio::process::Command::new(&binary)
        .args(&args)
        .status()
        .await?;
    if status.success() {
        Ok(())
    } else {
        Err(CloudShellError::Transport(format!("{program} exited with {status}")))
    }
}
