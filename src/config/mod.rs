//! Configuration system (layered: flags > env > config file > defaults).
//!
//! Flags and environment variables are merged by clap before they reach
//! [`ConfigOverrides`]; this module adds the optional TOML file and the
//! platform defaults, and produces one [`CloudShellConfig`] per run.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::auth::{AuthSettings, ClientSecrets};
use crate::error::{CloudShellError, Result};

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const CLIENT_SECRETS_FILE_NAME: &str = "client_secrets.json";
pub const CREDENTIALS_FILE_NAME: &str = "user_credentials.json";

/// `<config dir>/cloudshell`, e.g. `~/.config/cloudshell` on Linux.
pub fn default_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.config_dir().join("cloudshell"))
}

/// Optional settings file.
///
/// ```toml
/// client_secrets = "/path/to/client_secrets.json"
/// credentials = "/path/to/user_credentials.json"
/// project = "my-project"
/// callback_port = 9000
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub client_secrets: Option<PathBuf>,
    pub credentials: Option<PathBuf>,
    pub project: Option<String>,
    pub scope: Option<String>,
    pub callback_port: Option<u16>,
    pub auth_url: Option<String>,
    pub token_url: Option<String>,
    pub tokeninfo_url: Option<String>,
    pub environment_url: Option<String>,
}

impl ConfigFile {
    /// Read `path`; a missing file yields `None`.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let file = toml::from_str(&raw).map_err(|err| {
            CloudShellError::Configuration(format!("invalid {}: {err}", path.display()))
        })?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(Some(file))
    }
}

/// Values supplied on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub client_secrets: Option<PathBuf>,
    pub credentials: Option<PathBuf>,
    pub project: Option<String>,
    pub service_account: bool,
    pub force_reauth: bool,
    pub login_hint: Option<String>,
}

/// Everything one invocation needs, resolved up front.
#[derive(Debug, Clone)]
pub struct CloudShellConfig {
    pub client_secrets_path: PathBuf,
    pub credentials_path: PathBuf,
    /// Billing project for `X-Goog-User-Project`; may be empty.
    pub project_id: String,
    pub auth: AuthSettings,
    pub token_url: Option<String>,
    pub tokeninfo_url: Option<String>,
    pub environment_url: Option<String>,
    /// Parsed once here so the interactive flows and the project fallback agree.
    pub client_secrets: Option<ClientSecrets>,
}

impl CloudShellConfig {
    /// Resolve against the default config directory and its `config.toml`.
    pub fn load(overrides: ConfigOverrides) -> Result<Self> {
        let base = default_config_dir().ok_or_else(|| {
            CloudShellError::Configuration("cannot determine the user config directory".into())
        })?;
        let file_path = overrides
            .config_file
            .clone()
            .unwrap_or_else(|| base.join(CONFIG_FILE_NAME));
        let file = match ConfigFile::load(&file_path)? {
            Some(file) => file,
            None if overrides.config_file.is_some() => {
                return Err(CloudShellError::Configuration(format!(
                    "config file {} does not exist",
                    file_path.display()
                )))
            }
            None => ConfigFile::default(),
        };
        Self::resolve(overrides, file, &base)
    }

    /// Merge layers without touching the environment.
    pub fn resolve(overrides: ConfigOverrides, file: ConfigFile, base: &Path) -> Result<Self> {
        let client_secrets_path = overrides
            .client_secrets
            .or(file.client_secrets)
            .unwrap_or_else(|| base.join(CLIENT_SECRETS_FILE_NAME));
        let credentials_path = overrides
            .credentials
            .or(file.credentials)
            .unwrap_or_else(|| base.join(CREDENTIALS_FILE_NAME));

        let client_secrets = match ClientSecrets::load(&client_secrets_path) {
            Ok(secrets) => Some(secrets),
            Err(crate::auth::AuthError::NotFound(_)) => None,
            Err(err) => return Err(err.into()),
        };

        let project_id = overrides
            .project
            .or(file.project)
            .filter(|project| !project.is_empty())
            .or_else(|| {
                client_secrets
                    .as_ref()
                    .map(|secrets| secrets.installed.project_id.clone())
            })
            .unwrap_or_default();

        let mut auth = AuthSettings {
            service_account: overrides.service_account,
            // a login hint only makes sense on a fresh authorization
            force_reauth: overrides.force_reauth || overrides.login_hint.is_some(),
            login_hint: overrides.login_hint,
            ..AuthSettings::default()
        };
        if let Some(scope) = file.scope {
            auth.scope = scope;
        }
        if let Some(port) = file.callback_port {
            auth.callback_port = port;
        }
        // config.toml wins over the endpoints the client was registered with
        let installed = client_secrets.as_ref().map(|secrets| &secrets.installed);
        let registered = |uri: &str| (!uri.is_empty()).then(|| uri.to_string());
        if let Some(url) = file
            .auth_url
            .or_else(|| installed.and_then(|app| registered(&app.auth_uri)))
        {
            auth.auth_url = url;
        }
        let token_url = file
            .token_url
            .or_else(|| installed.and_then(|app| registered(&app.token_uri)));

        if project_id.is_empty() {
            tracing::warn!(
                "no project id configured; Cloud Shell calls omit X-Goog-User-Project"
            );
        }

        Ok(Self {
            client_secrets_path,
            credentials_path,
            project_id,
            auth,
            token_url,
            tokeninfo_url: file.tokeninfo_url,
            environment_url: file.environment_url,
            client_secrets,
        })
    }
}
