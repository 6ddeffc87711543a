//! OAuth credential lifecycle: storage, token endpoint calls and the
//! strategy table that decides how a token is obtained.

pub mod adc;
pub mod browser;
pub mod credentials;
pub mod error;
pub mod loopback;
pub mod oauth;
pub mod prompt;
pub mod provider;
pub mod store;
pub mod strategy;

pub use adc::{AdcSource, ApplicationDefaultCredentials};
pub use browser::{BrowserLauncher, SystemBrowser};
pub use credentials::{ClientSecrets, InstalledApp, OAuthTokenResponse, TokenPair, UserCredentials};
pub use error::AuthError;
pub use loopback::{AuthorizationCodeReceiver, LoopbackReceiver};
pub use oauth::OAuthClient;
pub use prompt::{CodePrompt, StdinPrompt};
pub use provider::{AuthContext, AuthSettings, TokenProvider};
pub use store::{CredentialStore, FileCredentialStore};
pub use strategy::{standard_strategies, TokenStrategy};
