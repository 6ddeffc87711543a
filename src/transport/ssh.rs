use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{require_key, run, Session, TransportDispatcher};
use crate::environment::SshTarget;
use crate::error::{CloudShellError, Result};

/// Opens a shell, or runs one remote command, over the system `ssh`.
#[derive(Debug, Clone)]
pub struct SshDispatcher {
    key: PathBuf,
    remote_command: Option<String>,
}

impl SshDispatcher {
    pub fn interactive(key: impl Into<PathBuf>) -> Self {
        Self {
            key: key.into(),
            remote_command: None,
        }
    }

    pub fn exec(key: impl Into<PathBuf>, command: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            remote_command: Some(command.into()),
        }
    }

    pub fn args(&self, target: &SshTarget) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-i".into(),
            self.key.clone().into(),
            "-p".into(),
            target.port.to_string().into(),
            target.destination().into(),
        ];
        if let Some(command) = &self.remote_command {
            args.push("--".into());
            args.push(command.into());
        }
        args
    }
}

#[async_trait]
impl TransportDispatcher for SshDispatcher {
    async fn dispatch(&self, session: &Session) -> Result<()> {
        let target = session.ssh_target()?;
        require_key(&self.key)?;
        run("ssh", self.args(&target)).await
    }
}

/// Direction and paths of one file copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transfer {
    Upload { local: PathBuf, remote: String },
    Download { remote: String, local: PathBuf },
}

impl Transfer {
    /// Upload `src`; the remote name defaults to the local file name.
    pub fn upload(src: &Path, dst: Option<String>) -> Result<Self> {
        let local = if src.is_absolute() {
            src.to_path_buf()
        } else {
            std::env::current_dir()?.join(src)
        };
        let remote = match dst {
            Some(dst) => dst.replace('\\', "/"),
            None => local
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .ok_or_else(|| no_file_name(&src.display().to_string()))?,
        };
        Ok(Self::Upload { local, remote })
    }

    /// Download `src`; the local name defaults to the remote file name.
    pub fn download(src: &str, dst: Option<PathBuf>) -> Result<Self> {
        let remote = src.replace('\\', "/");
        let local = match dst {
            Some(dst) => dst,
            None => remote
                .rsplit('/')
                .next()
                .filter(|name| !name.is_empty())
                .map(PathBuf::from)
                .ok_or_else(|| no_file_name(src))?,
        };
        Ok(Self::Download { remote, local })
    }
}

fn no_file_name(path: &str) -> CloudShellError {
    CloudShellError::Configuration(format!("{path} does not name a file"))
}

/// Copies a file to or from the environment with the system `scp`.
#[derive(Debug, Clone)]
pub struct ScpDispatcher {
    key: PathBuf,
    transfer: Transfer,
}

impl ScpDispatcher {
    pub fn new(key: impl Into<PathBuf>, transfer: Transfer) -> Self {
        Self {
            key: key.into(),
            transfer,
        }
    }

    pub fn args(&self, target: &SshTarget) -> Vec<OsString> {
        let remote = |path: &str| OsString::from(format!("{}:{path}", target.destination()));
        let mut args: Vec<OsString> = vec![
            "-i".into(),
            self.key.clone().into(),
            "-P".into(),
            target.port.to_string().into(),
        ];
        match &self.transfer {
            Transfer::Upload { local, remote: dst } => {
                args.push(local.clone().into());
                args.push(remote(dst.as_str()));
            }
            Transfer::Download { remote: src, local } => {
                args.push(remote(src.as_str()));
                args.push(local.clone().into());
            }
        }
        args
    }
}

#[async_trait]
impl TransportDispatcher for ScpDispatcher {
    async fn dispatch(&self, session: &Session) -> Result<()> {
        let target = session.ssh_target()?;
        require_key(&self.key)?;
        if let Transfer::Upload { local, .. } = &self.transfer {
            if !local.is_file() {
                return Err(CloudShellError::Configuration(format!(
                    "{} is not a file",
                    local.display()
                )));
            }
        }
        tracing::info!(transfer = ?self.transfer, "copying file");
        run("scp", self.args(&target)).await
    }
}
