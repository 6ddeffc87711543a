#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use cloudshell::auth::{
    standard_strategies, AdcSource, AuthContext, AuthError, AuthSettings,
    AuthorizationCodeReceiver, BrowserLauncher, ClientSecrets, CodePrompt, CredentialStore,
    InstalledApp, OAuthClient, TokenProvider, UserCredentials,
};
use wiremock::MockServer;

#[derive(Default)]
pub struct InMemoryCredentialStore {
    creds: Mutex<Option<UserCredentials>>,
    saves: Mutex<u32>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(creds: UserCredentials) -> Self {
        let store = Self::default();
        *store.creds.lock().expect("store lock poisoned") = Some(creds);
        store
    }

    pub fn get(&self) -> Option<UserCredentials> {
        self.creds.lock().expect("store lock poisoned").clone()
    }

    pub fn save_count(&self) -> u32 {
        *self.saves.lock().expect("store lock poisoned")
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn exists(&self) -> bool {
        self.get().is_some()
    }

    fn load(&self) -> Result<UserCredentials, AuthError> {
        self.get()
            .ok_or_else(|| AuthError::NotFound(PathBuf::from("memory")))
    }

    fn save(&self, creds: &UserCredentials) -> Result<(), AuthError> {
        *self.creds.lock().expect("store lock poisoned") = Some(creds.clone());
        *self.saves.lock().expect("store lock poisoned") += 1;
        Ok(())
    }
}

/// Browser stand-in that records opened URLs.
#[derive(Default)]
pub struct FakeBrowser {
    pub available: bool,
    pub opened: Mutex<Vec<String>>,
}

impl FakeBrowser {
    pub fn available() -> Self {
        Self {
            available: true,
            ..Self::default()
        }
    }

    pub fn headless() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().expect("browser lock poisoned").clone()
    }
}

impl BrowserLauncher for FakeBrowser {
    fn is_available(&self) -> bool {
        self.available
    }

    fn open(&self, url: &str) -> Result<(), AuthError> {
        self.opened
            .lock()
            .expect("browser lock poisoned")
            .push(url.to_string());
        Ok(())
    }
}

/// Returns a fixed authorization code and records the port it was asked for.
pub struct FixedCode {
    pub code: String,
    pub ports: Mutex<Vec<u16>>,
    pub urls: Mutex<Vec<String>>,
}

impl FixedCode {
    pub fn new(code: &str) -> Self {
        Self {
            code: code.to_string(),
            ports: Mutex::new(Vec::new()),
            urls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AuthorizationCodeReceiver for FixedCode {
    async fn await_code(&self, port: u16) -> Result<String, AuthError> {
        self.ports.lock().expect("lock poisoned").push(port);
        Ok(self.code.clone())
    }
}

#[async_trait]
impl CodePrompt for FixedCode {
    async fn read_code(&self, authorize_url: &str) -> Result<String, AuthError> {
        self.urls
            .lock()
            .expect("lock poisoned")
            .push(authorize_url.to_string());
        Ok(self.code.clone())
    }
}

/// Ambient credentials stand-in.
pub struct StaticAdc(pub Result<String, String>);

#[async_trait]
impl AdcSource for StaticAdc {
    async fn access_token(&self) -> Result<String, AuthError> {
        self.0.clone().map_err(AuthError::Authorization)
    }
}

pub fn client_secrets() -> ClientSecrets {
    ClientSecrets {
        installed: InstalledApp {
            client_id: "client-id.apps.googleusercontent.com".to_string(),
            project_id: "test-project".to_string(),
            auth_uri: "https://accounts.google.com/o/oauth2/auth".to_string(),
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
            auth_provider_x509_cert_url: "https://www.googleapis.com/oauth2/v1/certs".to_string(),
            client_secret: "client-secret".to_string(),
            redirect_uris: vec!["urn:ietf:wg:oauth:2.0:oob".to_string()],
        },
    }
}

/// Saved credentials expiring `expires_in_secs` from now.
pub fn saved_credentials(expires_in_secs: i64) -> UserCredentials {
    UserCredentials {
        client_id: "client-id.apps.googleusercontent.com".to_string(),
        client_secret: "client-secret".to_string(),
        refresh_token: "saved-refresh".to_string(),
        scope: "openid".to_string(),
        token_type: "Bearer".to_string(),
        access_token: "saved-access".to_string(),
        id_token: "saved-id".to_string(),
        email: "saved@example.com".to_string(),
        expires_at: Utc::now().timestamp() + expires_in_secs,
    }
}

pub fn oauth_client(server: &MockServer) -> OAuthClient {
    OAuthClient::new()
        .with_token_url(format!("{}/token", server.uri()))
        .with_tokeninfo_url(format!("{}/tokeninfo", server.uri()))
}

/// Collaborators handed to [`provider`].
pub struct Fakes {
    pub adc: Arc<StaticAdc>,
    pub browser: Arc<FakeBrowser>,
    pub code: Arc<FixedCode>,
}

impl Default for Fakes {
    fn default() -> Self {
        Self {
            adc: Arc::new(StaticAdc(Ok("adc-access".to_string()))),
            browser: Arc::new(FakeBrowser::headless()),
            code: Arc::new(FixedCode::new("auth-code")),
        }
    }
}

pub fn provider(
    store: Arc<InMemoryCredentialStore>,
    server: &MockServer,
    settings: AuthSettings,
    fakes: &Fakes,
) -> TokenProvider {
    let ctx = AuthContext {
        store,
        oauth: oauth_client(server),
        settings,
        client_secrets: Some(client_secrets()),
        client_secrets_path: PathBuf::from("client_secrets.json"),
    };
    let strategies = standard_strategies(
        fakes.adc.clone(),
        fakes.browser.clone(),
        fakes.code.clone(),
        fakes.code.clone(),
    );
    TokenProvider::new(ctx, strategies)
}
