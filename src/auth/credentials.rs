use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::error::AuthError;

/// Safety margin before `expires_at` after which a cached token is refreshed.
pub const FRESHNESS_MARGIN_SECS: i64 = 15 * 60;

/// Operator-supplied OAuth app registration (`client_secrets.json`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecrets {
    pub installed: InstalledApp,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InstalledApp {
    pub client_id: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub auth_uri: String,
    #[serde(default)]
    pub token_uri: String,
    #[serde(default)]
    pub auth_provider_x509_cert_url: String,
    pub client_secret: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

impl ClientSecrets {
    /// Read and parse a client registration file.
    pub fn load(path: &Path) -> Result<Self, AuthError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(AuthError::NotFound(path.to_path_buf()))
            }
            Err(err) => return Err(AuthError::Io(err.to_string())),
        };
        serde_json::from_str(&raw).map_err(|err| AuthError::InvalidFile {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }
}

/// The persisted user credential record.
///
/// `expires_at` is an absolute unix timestamp in seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub scope: String,
    #[serde(rename = "type")]
    pub token_type: String,
    pub access_token: String,
    pub id_token: String,
    pub email: String,
    pub expires_at: i64,
}

impl UserCredentials {
    /// Whether the access token stays valid past the freshness margin at `now`.
    pub fn is_fresh_at(&self, now: i64) -> bool {
        now < self.expires_at.saturating_sub(FRESHNESS_MARGIN_SECS)
    }

    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Utc::now().timestamp())
    }

    pub fn tokens(&self) -> TokenPair {
        TokenPair {
            access_token: self.access_token.clone(),
            id_token: self.id_token.clone(),
        }
    }
}

/// Wire shape of a token endpoint response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OAuthTokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub refresh_token: String,
    pub scope: String,
    pub token_type: String,
    pub id_token: String,
    pub error: String,
    pub error_description: String,
}

impl OAuthTokenResponse {
    /// Absolute expiry for a response received at `now`.
    pub fn expires_at(&self, now: i64) -> i64 {
        now.saturating_add(self.expires_in)
    }
}

/// Access token plus the (possibly empty) OpenID id token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub id_token: String,
}

impl TokenPair {
    pub fn access_only(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            id_token: String::new(),
        }
    }
}
