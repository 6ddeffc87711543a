//! Application Default Credentials (ambient, non-interactive credentials).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;

use super::error::AuthError;
use super::oauth::OAuthClient;

pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
const DEFAULT_METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";
const WELL_KNOWN_FILE: &str = "application_default_credentials.json";

/// Source of an ambient access token.
#[async_trait]
pub trait AdcSource: Send + Sync {
    async fn access_token(&self) -> Result<String, AuthError>;
}

/// Resolves Application Default Credentials in gcloud's order:
/// `GOOGLE_APPLICATION_CREDENTIALS`, the gcloud well-known file, then the
/// Compute Engine metadata server.
///
/// `authorized_user` files are refreshed through the token endpoint.
/// `service_account` key files would need JWT signing and are rejected.
#[derive(Debug, Clone)]
pub struct ApplicationDefaultCredentials {
    client: reqwest::Client,
    oauth: OAuthClient,
    credentials_file: Option<PathBuf>,
    well_known_file: Option<PathBuf>,
    metadata_url: String,
}

impl ApplicationDefaultCredentials {
    pub fn new(oauth: OAuthClient) -> Self {
        Self {
            client: reqwest::Client::new(),
            oauth,
            credentials_file: std::env::var_os("GOOGLE_APPLICATION_CREDENTIALS")
                .map(PathBuf::from)
                .filter(|path| !path.as_os_str().is_empty()),
            well_known_file: default_well_known_file(),
            metadata_url: DEFAULT_METADATA_TOKEN_URL.to_string(),
        }
    }

    pub fn with_credentials_file(mut self, path: Option<PathBuf>) -> Self {
        self.credentials_file = path;
        self
    }

    pub fn with_well_known_file(mut self, path: Option<PathBuf>) -> Self {
        self.well_known_file = path;
        self
    }

    pub fn with_metadata_url(mut self, url: impl Into<String>) -> Self {
        self.metadata_url = url.into();
        self
    }

    async fn token_from_file(&self, path: &Path) -> Result<String, AuthError> {
        tracing::debug!(path = %path.display(), "using application default credentials file");
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(AuthError::NotFound(path.to_path_buf()))
            }
            Err(err) => return Err(AuthError::Io(err.to_string())),
        };
        let file: AdcFile = serde_json::from_str(&raw).map_err(|err| AuthError::InvalidFile {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        match file {
            AdcFile::AuthorizedUser {
                client_id,
                client_secret,
                refresh_token,
            } => {
                let tokens = self
                    .oauth
                    .refresh(&client_id, &client_secret, &refresh_token)
                    .await?;
                Ok(tokens.access_token)
            }
            AdcFile::ServiceAccount { client_email } => Err(AuthError::Unsupported(format!(
                "service account key {} ({client_email}) requires JWT signing; \
                 use `gcloud auth application-default login` or run on Compute Engine",
                path.display()
            ))),
            AdcFile::Unknown => Err(AuthError::Unsupported(format!(
                "unrecognised credential type in {}",
                path.display()
            ))),
        }
    }

    async fn token_from_metadata(&self) -> Result<String, AuthError> {
        tracing::debug!(url = %self.metadata_url, "requesting token from metadata server");
        let resp = self
            .client
            .get(&self.metadata_url)
            .header("Metadata-Flavor", "Google")
            .query(&[("scopes", CLOUD_PLATFORM_SCOPE)])
            .send()
            .await
            .map_err(|err| {
                AuthError::Authorization(format!(
                    "no application default credentials found (metadata server: {err})"
                ))
            })?;
        if !resp.status().is_success() {
            return Err(AuthError::Rejected(format!(
                "metadata server returned status {}",
                resp.status()
            )));
        }
        let body = resp.bytes().await?;
        let token: MetadataToken = serde_json::from_slice(&body)?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl AdcSource for ApplicationDefaultCredentials {
    async fn access_token(&self) -> Result<String, AuthError> {
        if let Some(path) = &self.credentials_file {
            return self.token_from_file(path).await;
        }
        if let Some(path) = self.well_known_file.as_deref().filter(|p| p.is_file()) {
            return self.token_from_file(path).await;
        }
        self.token_from_metadata().await
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum AdcFile {
    #[serde(rename = "authorized_user")]
    AuthorizedUser {
        client_id: String,
        client_secret: String,
        refresh_token: String,
    },
    #[serde(rename = "service_account")]
    ServiceAccount {
        #[serde(default)]
        client_email: String,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
}

fn default_well_known_file() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os("CLOUDSDK_CONFIG").filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(dir).join(WELL_KNOWN_FILE));
    }
    let dirs = directories::BaseDirs::new()?;
    let base = if cfg!(windows) {
        dirs.config_dir().to_path_buf()
    } else {
        dirs.home_dir().join(".config")
    };
    Some(base.join("gcloud").join(WELL_KNOWN_FILE))
}
