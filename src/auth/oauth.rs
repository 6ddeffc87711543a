use reqwest::StatusCode;
use serde::Deserialize;

use super::credentials::OAuthTokenResponse;
use super::error::AuthError;

pub const DEFAULT_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const DEFAULT_TOKEN_URL: &str = "https://www.googleapis.com/oauth2/v4/token";
pub const DEFAULT_TOKENINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/tokeninfo";
/// Redirect sentinel for the manual copy/paste flow.
pub const OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Stateless client for Google's token and tokeninfo endpoints.
///
/// # Example
/// ```no_run
/// use cloudshell::auth::OAuthClient;
///
/// # async fn example() -> Result<(), cloudshell::auth::AuthError> {
/// let client = OAuthClient::new();
/// let tokens = client.refresh("client-id", "client-secret", "refresh-token").await?;
/// println!("expires in {}s", tokens.expires_in);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OAuthClient {
    client: reqwest::Client,
    token_url: String,
    tokeninfo_url: String,
}

impl Default for OAuthClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OAuthClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            tokeninfo_url: DEFAULT_TOKENINFO_URL.to_string(),
        }
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    pub fn with_tokeninfo_url(mut self, url: impl Into<String>) -> Self {
        self.tokeninfo_url = url.into();
        self
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
        redirect_uri: &str,
    ) -> Result<OAuthTokenResponse, AuthError> {
        self.post_token(&[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
        ])
        .await
    }

    /// Mint a new access token from a refresh token.
    pub async fn refresh(
        &self,
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
    ) -> Result<OAuthTokenResponse, AuthError> {
        self.post_token(&[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    /// Look up the account email for an access token.
    ///
    /// Best effort: any failure yields an empty string.
    pub async fn get_email(&self, access_token: &str) -> String {
        match self.fetch_token_info(access_token).await {
            Ok(info) => info.email,
            Err(err) => {
                tracing::warn!(error = %err, "tokeninfo lookup failed; continuing without email");
                String::new()
            }
        }
    }

    async fn fetch_token_info(&self, access_token: &str) -> Result<TokenInfo, AuthError> {
        let resp = self
            .client
            .get(&self.tokeninfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(AuthError::InvalidResponse(format!(
                "tokeninfo request failed with status {}",
                resp.status()
            )));
        }
        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn post_token(&self, form: &[(&str, &str)]) -> Result<OAuthTokenResponse, AuthError> {
        let resp = self
            .client
            .post(&self.token_url)
            .header("Accept", "application/json")
            .form(form)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        tracing::debug!(%status, bytes = body.len(), "token endpoint responded");
        interpret_token_response(status, &body)
    }
}

fn interpret_token_response(
    status: StatusCode,
    body: &[u8],
) -> Result<OAuthTokenResponse, AuthError> {
    let tokens: OAuthTokenResponse = match serde_json::from_slice(body) {
        Ok(tokens) => tokens,
        Err(err) if status.is_success() => {
            return Err(AuthError::InvalidResponse(format!(
                "cannot parse token response: {err}"
            )))
        }
        Err(_) => {
            return Err(AuthError::Rejected(format!(
                "token endpoint returned status {status}"
            )))
        }
    };
    if !tokens.error.is_empty() {
        let message = if tokens.error_description.is_empty() {
            tokens.error.clone()
        } else {
            tokens.error_description.clone()
        };
        return Err(AuthError::Rejected(message));
    }
    if !status.is_success() {
        return Err(AuthError::Rejected(format!(
            "token endpoint returned status {status}"
        )));
    }
    if tokens.access_token.is_empty() {
        return Err(AuthError::InvalidResponse(
            "token response missing access_token".to_string(),
        ));
    }
    Ok(tokens)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TokenInfo {
    email: String,
}
