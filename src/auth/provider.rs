use std::path::PathBuf;
use std::sync::Arc;

use super::credentials::{ClientSecrets, TokenPair};
use super::error::AuthError;
use super::oauth::{OAuthClient, DEFAULT_AUTH_URL};
use super::store::CredentialStore;
use super::strategy::TokenStrategy;

pub const DEFAULT_SCOPE: &str = "openid https://www.googleapis.com/auth/userinfo.email \
                                 https://www.googleapis.com/auth/cloud-platform";
pub const DEFAULT_CALLBACK_PORT: u16 = 9000;

/// Per-invocation authentication settings.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Use ambient service-account credentials instead of a user login.
    pub service_account: bool,
    /// Ignore saved credentials and sign in again.
    pub force_reauth: bool,
    pub login_hint: Option<String>,
    pub scope: String,
    pub auth_url: String,
    pub callback_port: u16,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            service_account: false,
            force_reauth: false,
            login_hint: None,
            scope: DEFAULT_SCOPE.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            callback_port: DEFAULT_CALLBACK_PORT,
        }
    }
}

impl AuthSettings {
    pub fn loopback_redirect_uri(&self) -> String {
        format!("http://localhost:{}", self.callback_port)
    }
}

/// Everything a [`TokenStrategy`] may consult.
pub struct AuthContext {
    pub store: Arc<dyn CredentialStore>,
    pub oauth: OAuthClient,
    pub settings: AuthSettings,
    pub client_secrets: Option<ClientSecrets>,
    /// Where the client secrets were expected, for error messages.
    pub client_secrets_path: PathBuf,
}

impl AuthContext {
    /// The app registration, required by the interactive flows only.
    pub fn client_secrets(&self) -> Result<&ClientSecrets, AuthError> {
        self.client_secrets
            .as_ref()
            .ok_or_else(|| AuthError::NotFound(self.client_secrets_path.clone()))
    }
}

/// Decides how to obtain an access token and runs that one path.
///
/// Strategies are consulted in order; the first that applies is used and its
/// failure is final. There is no fallback to a later strategy.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use cloudshell::auth::*;
///
/// # async fn example() -> Result<(), AuthError> {
/// let oauth = OAuthClient::new();
/// let ctx = AuthContext {
///     store: Arc::new(FileCredentialStore::new("/tmp/user_credentials.json")),
///     oauth: oauth.clone(),
///     settings: AuthSettings::default(),
///     client_secrets: None,
///     client_secrets_path: "/tmp/client_secrets.json".into(),
/// };
/// let strategies = standard_strategies(
///     Arc::new(ApplicationDefaultCredentials::new(oauth)),
///     Arc::new(SystemBrowser),
///     Arc::new(LoopbackReceiver),
///     Arc::new(StdinPrompt),
/// );
/// let provider = TokenProvider::new(ctx, strategies);
/// let tokens = provider.get_token().await?;
/// # Ok(())
/// # }
/// ```
pub struct TokenProvider {
    ctx: AuthContext,
    strategies: Vec<Box<dyn TokenStrategy>>,
}

impl TokenProvider {
    pub fn new(ctx: AuthContext, strategies: Vec<Box<dyn TokenStrategy>>) -> Self {
        Self { ctx, strategies }
    }

    pub fn context(&self) -> &AuthContext {
        &self.ctx
    }

    /// The first strategy that applies to this invocation.
    pub fn select(&self) -> Option<&dyn TokenStrategy> {
        self.strategies
            .iter()
            .map(Box::as_ref)
            .find(|strategy| strategy.applies(&self.ctx))
    }

    pub async fn get_token(&self) -> Result<TokenPair, AuthError> {
        let strategy = self.select().ok_or_else(|| {
            AuthError::Unsupported("no token strategy applies to this invocation".to_string())
        })?;
        tracing::debug!(strategy = strategy.name(), "acquiring access token");
        strategy.acquire(&self.ctx).await
    }
}
