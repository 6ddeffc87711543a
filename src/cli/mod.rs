//! CLI entry point for cloudshell.

pub mod errors;
mod logging;
mod run;

pub use errors::format_error_help;
pub use logging::init_logging;
pub use run::run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::ConfigOverrides;

/// Google Cloud Shell from the command line
#[derive(Parser, Debug)]
#[command(
    name = "cloudshell",
    version,
    about = "Start and connect to Google Cloud Shell"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Turn on debug output (same as --log-level debug)
    #[arg(long, global = true)]
    pub debug: bool,

    /// (Re)authenticate, ignoring saved user credentials
    #[arg(long, global = true)]
    pub auth: bool,

    /// Email address to pass as a login hint (implies --auth)
    #[arg(long, global = true, value_name = "EMAIL")]
    pub login: Option<String>,

    /// Use application default (service account) credentials
    #[arg(long, global = true)]
    pub adc: bool,

    /// OAuth client registration file
    #[arg(long, global = true, env = "CLOUDSHELL_CLIENT_SECRETS", value_name = "PATH")]
    pub client_secrets: Option<PathBuf>,

    /// Saved user credentials file
    #[arg(long, global = true, env = "CLOUDSHELL_CREDENTIALS", value_name = "PATH")]
    pub credentials: Option<PathBuf>,

    /// Project billed for Cloud Shell API calls
    #[arg(long, global = true, env = "CLOUDSHELL_PROJECT")]
    pub project: Option<String>,

    /// Settings file (default: <config dir>/cloudshell/config.toml)
    #[arg(long, global = true, env = "CLOUDSHELL_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Output logs as JSON instead of human-readable
    #[arg(long, global = true, default_value_t = false)]
    pub json_logs: bool,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Display Cloud Shell information (default)
    Info,
    /// Open an interactive shell
    #[command(alias = "putty")]
    Ssh,
    /// Execute a remote command
    Exec {
        /// Command line run by the remote shell
        command: String,
    },
    /// Upload a local file
    Upload {
        src: PathBuf,
        /// Remote path (default: the local file name)
        dst: Option<String>,
    },
    /// Download a remote file
    Download {
        src: String,
        /// Local path (default: the remote file name)
        dst: Option<PathBuf>,
    },
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Info)
    }

    /// Filter directive for the log subscriber.
    pub fn log_filter(&self) -> &str {
        if self.debug {
            "debug"
        } else {
            &self.log_level
        }
    }

    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_file: self.config.clone(),
            client_secrets: self.client_secrets.clone(),
            credentials: self.credentials.clone(),
            project: self.project.clone(),
            service_account: self.adc,
            force_reauth: self.auth,
            login_hint: self.login.clone(),
        }
    }
}
