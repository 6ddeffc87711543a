//! cloudshell: Google Cloud Shell credential lifecycle and environment
//! orchestration.
//!
//! Obtains an OAuth access token (cached, refreshed, interactive or from
//! application default credentials), makes sure the operator's Cloud Shell
//! environment is running and hands its SSH coordinates to a transport.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use cloudshell::environment::{CloudShellClient, EnvironmentOrchestrator};
//!
//! # async fn example(access_token: &str) -> cloudshell::error::Result<()> {
//! let client = CloudShellClient::new("my-project");
//! let env = EnvironmentOrchestrator::new(Arc::new(client))
//!     .ensure_running(access_token)
//!     .await?;
//! println!("ssh -p {} {}@{}", env.ssh_port, env.ssh_username, env.ssh_host);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod environment;
pub mod error;
pub mod transport;

#[cfg(feature = "cli")]
pub mod cli;
