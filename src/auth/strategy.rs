//! Token acquisition strategies, evaluated in priority order by
//! [`TokenProvider`](super::provider::TokenProvider).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Url;

use super::adc::AdcSource;
use super::browser::BrowserLauncher;
use super::credentials::{ClientSecrets, TokenPair, UserCredentials};
use super::error::AuthError;
use super::loopback::AuthorizationCodeReceiver;
use super::oauth::OOB_REDIRECT_URI;
use super::prompt::CodePrompt;
use super::provider::AuthContext;

/// One row of the token decision table.
#[async_trait]
pub trait TokenStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this strategy handles the current invocation.
    fn applies(&self, ctx: &AuthContext) -> bool;

    async fn acquire(&self, ctx: &AuthContext) -> Result<TokenPair, AuthError>;
}

/// The standard table: service account, cached refresh, browser, manual.
pub fn standard_strategies(
    adc: Arc<dyn AdcSource>,
    browser: Arc<dyn BrowserLauncher>,
    receiver: Arc<dyn AuthorizationCodeReceiver>,
    prompt: Arc<dyn CodePrompt>,
) -> Vec<Box<dyn TokenStrategy>> {
    vec![
        Box::new(ServiceAccountStrategy::new(adc)),
        Box::new(CachedRefreshStrategy),
        Box::new(BrowserStrategy::new(browser, receiver)),
        Box::new(ManualStrategy::new(prompt)),
    ]
}

/// Ambient service-account credentials; the id token is always empty.
pub struct ServiceAccountStrategy {
    source: Arc<dyn AdcSource>,
}

impl ServiceAccountStrategy {
    pub fn new(source: Arc<dyn AdcSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl TokenStrategy for ServiceAccountStrategy {
    fn name(&self) -> &'static str {
        "service-account"
    }

    fn applies(&self, ctx: &AuthContext) -> bool {
        ctx.settings.service_account
    }

    async fn acquire(&self, _ctx: &AuthContext) -> Result<TokenPair, AuthError> {
        let access_token = self.source.access_token().await?;
        Ok(TokenPair::access_only(access_token))
    }
}

/// Reuse the persisted credentials, refreshing them once they go stale.
pub struct CachedRefreshStrategy;

#[async_trait]
impl TokenStrategy for CachedRefreshStrategy {
    fn name(&self) -> &'static str {
        "cached-refresh"
    }

    fn applies(&self, ctx: &AuthContext) -> bool {
        !ctx.settings.force_reauth && ctx.store.exists()
    }

    async fn acquire(&self, ctx: &AuthContext) -> Result<TokenPair, AuthError> {
        let mut creds = ctx.store.load()?;
        if creds.is_fresh() {
            tracing::debug!(expires_at = creds.expires_at, "saved access token is still fresh");
            return Ok(creds.tokens());
        }
        if creds.refresh_token.is_empty() {
            return Err(AuthError::Authorization(
                "saved credentials have no refresh token; re-run with --auth".to_string(),
            ));
        }

        tracing::debug!("saved access token is stale; refreshing");
        let tokens = ctx
            .oauth
            .refresh(&creds.client_id, &creds.client_secret, &creds.refresh_token)
            .await?;
        let expires_at = tokens.expires_at(Utc::now().timestamp());

        creds.access_token = tokens.access_token;
        creds.id_token = tokens.id_token;
        creds.expires_at = expires_at;
        if !tokens.refresh_token.is_empty() {
            creds.refresh_token = tokens.refresh_token;
        }
        let email = ctx.oauth.get_email(&creds.access_token).await;
        if !email.is_empty() {
            creds.email = email;
        }

        ctx.store.save(&creds)?;
        Ok(creds.tokens())
    }
}

/// Interactive login through the system browser and a loopback redirect.
pub struct BrowserStrategy {
    browser: Arc<dyn BrowserLauncher>,
    receiver: Arc<dyn AuthorizationCodeReceiver>,
}

impl BrowserStrategy {
    pub fn new(
        browser: Arc<dyn BrowserLauncher>,
        receiver: Arc<dyn AuthorizationCodeReceiver>,
    ) -> Self {
        Self { browser, receiver }
    }
}

#[async_trait]
impl TokenStrategy for BrowserStrategy {
    fn name(&self) -> &'static str {
        "browser"
    }

    fn applies(&self, _ctx: &AuthContext) -> bool {
        self.browser.is_available()
    }

    async fn acquire(&self, ctx: &AuthContext) -> Result<TokenPair, AuthError> {
        let secrets = ctx.client_secrets()?;
        let redirect_uri = ctx.settings.loopback_redirect_uri();
        let url = authorize_url(ctx, secrets, &redirect_uri)?;

        tracing::info!("opening browser for Google sign-in");
        self.browser.open(&url)?;
        let code = self.receiver.await_code(ctx.settings.callback_port).await?;
        exchange_and_persist(ctx, secrets, &code, &redirect_uri).await
    }
}

/// Out-of-band login: the operator pastes the code back by hand.
pub struct ManualStrategy {
    prompt: Arc<dyn CodePrompt>,
}

impl ManualStrategy {
    pub fn new(prompt: Arc<dyn CodePrompt>) -> Self {
        Self { prompt }
    }
}

#[async_trait]
impl TokenStrategy for ManualStrategy {
    fn name(&self) -> &'static str {
        "manual"
    }

    fn applies(&self, _ctx: &AuthContext) -> bool {
        true
    }

    async fn acquire(&self, ctx: &AuthContext) -> Result<TokenPair, AuthError> {
        let secrets = ctx.client_secrets()?;
        let url = authorize_url(ctx, secrets, OOB_REDIRECT_URI)?;
        let code = self.prompt.read_code(&url).await?;
        exchange_and_persist(ctx, secrets, &code, OOB_REDIRECT_URI).await
    }
}

/// Build the consent URL for an installed-app authorization code grant.
pub fn authorize_url(
    ctx: &AuthContext,
    secrets: &ClientSecrets,
    redirect_uri: &str,
) -> Result<String, AuthError> {
    let mut params = vec![
        ("client_id", secrets.installed.client_id.as_str()),
        ("response_type", "code"),
        ("scope", ctx.settings.scope.as_str()),
        ("access_type", "offline"),
        ("redirect_uri", redirect_uri),
    ];
    if let Some(hint) = ctx.settings.login_hint.as_deref().filter(|h| !h.is_empty()) {
        params.push(("login_hint", hint));
    }
    let url = Url::parse_with_params(&ctx.settings.auth_url, &params)
        .map_err(|err| AuthError::Unsupported(format!("invalid authorization URL: {err}")))?;
    Ok(url.into())
}

async fn exchange_and_persist(
    ctx: &AuthContext,
    secrets: &ClientSecrets,
    code: &str,
    redirect_uri: &str,
) -> Result<TokenPair, AuthError> {
    let app = &secrets.installed;
    let tokens = ctx
        .oauth
        .exchange_code(&app.client_id, &app.client_secret, code, redirect_uri)
        .await?;
    let expires_at = tokens.expires_at(Utc::now().timestamp());

    // Google omits the refresh token when consent was granted earlier.
    let refresh_token = if tokens.refresh_token.is_empty() {
        previous_refresh_token(ctx, &app.client_id)
    } else {
        tokens.refresh_token
    };

    let mut creds = UserCredentials {
        client_id: app.client_id.clone(),
        client_secret: app.client_secret.clone(),
        refresh_token,
        scope: tokens.scope,
        token_type: tokens.token_type,
        access_token: tokens.access_token,
        id_token: tokens.id_token,
        email: String::new(),
        expires_at,
    };
    creds.email = ctx.oauth.get_email(&creds.access_token).await;
    if !creds.email.is_empty() {
        tracing::info!(email = %creds.email, "signed in");
    }

    ctx.store.save(&creds)?;
    Ok(creds.tokens())
}

fn previous_refresh_token(ctx: &AuthContext, client_id: &str) -> String {
    if !ctx.store.exists() {
        return String::new();
    }
    match ctx.store.load() {
        Ok(previous) if previous.client_id == client_id => previous.refresh_token,
        Ok(_) => String::new(),
        Err(err) => {
            tracing::warn!(error = %err, "cannot read previous credentials");
            String::new()
        }
    }
}
