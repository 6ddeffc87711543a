mod auth_support;

use std::sync::Arc;

use chrono::Utc;
use cloudshell::auth::{AuthError, AuthSettings, TokenPair};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_support::{
    provider, saved_credentials, FakeBrowser, Fakes, InMemoryCredentialStore, StaticAdc,
};

async fn mount_tokeninfo(server: &MockServer, email: &str) {
    Mock::given(method("GET"))
        .and(path("/tokeninfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "email": email })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn fresh_saved_token_is_returned_without_network_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryCredentialStore::seeded(saved_credentials(3600)));
    let provider = provider(store.clone(), &server, AuthSettings::default(), &Fakes::default());

    assert_eq!(provider.select().map(|s| s.name()), Some("cached-refresh"));
    let tokens = provider.get_token().await.expect("cached token");

    assert_eq!(
        tokens,
        TokenPair {
            access_token: "saved-access".to_string(),
            id_token: "saved-id".to_string(),
        }
    );
    assert_eq!(store.save_count(), 0);
}

#[tokio::test]
async fn stale_token_is_refreshed_once_and_persisted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=saved-refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "new-access",
            "expires_in": 3599,
            "id_token": "new-id",
            "scope": "openid",
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_tokeninfo(&server, "fresh@example.com").await;

    // inside the 15 minute margin
    let store = Arc::new(InMemoryCredentialStore::seeded(saved_credentials(600)));
    let provider = provider(store.clone(), &server, AuthSettings::default(), &Fakes::default());

    let before = Utc::now().timestamp();
    let tokens = provider.get_token().await.expect("refreshed token");
    let after = Utc::now().timestamp();

    assert_eq!(tokens.access_token, "new-access");
    assert_eq!(tokens.id_token, "new-id");

    let saved = store.get().expect("credentials saved");
    assert_eq!(store.save_count(), 1);
    assert_eq!(saved.access_token, "new-access");
    assert_eq!(saved.refresh_token, "saved-refresh");
    assert_eq!(saved.email, "fresh@example.com");
    assert!(saved.expires_at >= before + 3599 - 1);
    assert!(saved.expires_at <= after + 3599 + 1);
}

#[tokio::test]
async fn rotated_refresh_token_replaces_saved_one() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "new-access",
            "expires_in": 3600,
            "refresh_token": "rotated-refresh"
        })))
        .expect(1)
        .mount(&server)
        .await;
    // tokeninfo failure is ignored and the old email kept
    Mock::given(method("GET"))
        .and(path("/tokeninfo"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryCredentialStore::seeded(saved_credentials(-60)));
    let provider = provider(store.clone(), &server, AuthSettings::default(), &Fakes::default());

    provider.get_token().await.expect("refreshed token");

    let saved = store.get().expect("credentials saved");
    assert_eq!(saved.refresh_token, "rotated-refresh");
    assert_eq!(saved.email, "saved@example.com");
}

#[tokio::test]
async fn rejected_refresh_leaves_store_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Token has been expired or revoked."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let original = saved_credentials(-60);
    let store = Arc::new(InMemoryCredentialStore::seeded(original.clone()));
    let fakes = Fakes {
        browser: Arc::new(FakeBrowser::available()),
        ..Fakes::default()
    };
    let provider = provider(store.clone(), &server, AuthSettings::default(), &fakes);

    let err = provider.get_token().await.expect_err("refresh must fail");

    match err {
        AuthError::Rejected(message) => {
            assert_eq!(message, "Token has been expired or revoked.")
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
    assert_eq!(store.get(), Some(original));
    assert_eq!(store.save_count(), 0);
    // no fallback into the interactive flow
    assert!(fakes.browser.opened().is_empty());
}

#[tokio::test]
async fn missing_credentials_select_interactive_flow() {
    let server = MockServer::start().await;
    let store = Arc::new(InMemoryCredentialStore::new());

    let headless = provider(store.clone(), &server, AuthSettings::default(), &Fakes::default());
    assert_eq!(headless.select().map(|s| s.name()), Some("manual"));

    let desktop = Fakes {
        browser: Arc::new(FakeBrowser::available()),
        ..Fakes::default()
    };
    let desktop = provider(store, &server, AuthSettings::default(), &desktop);
    assert_eq!(desktop.select().map(|s| s.name()), Some("browser"));
}

#[tokio::test]
async fn browser_flow_exchanges_loopback_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(header("accept", "application/json"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth-code"))
        .and(body_string_contains("redirect_uri=http%3A%2F%2Flocalhost%3A9000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "browser-access",
            "expires_in": 3600,
            "refresh_token": "browser-refresh",
            "id_token": "browser-id",
            "scope": "openid",
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_tokeninfo(&server, "me@example.com").await;

    let store = Arc::new(InMemoryCredentialStore::new());
    let fakes = Fakes {
        browser: Arc::new(FakeBrowser::available()),
        ..Fakes::default()
    };
    let settings = AuthSettings {
        login_hint: Some("me@example.com".to_string()),
        ..AuthSettings::default()
    };
    let provider = provider(store.clone(), &server, settings, &fakes);

    let tokens = provider.get_token().await.expect("browser login");

    assert_eq!(tokens.access_token, "browser-access");
    let opened = fakes.browser.opened();
    assert_eq!(opened.len(), 1);
    assert!(opened[0].starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
    assert!(opened[0].contains("access_type=offline"));
    assert!(opened[0].contains("login_hint=me%40example.com"));
    assert!(opened[0].contains("redirect_uri=http%3A%2F%2Flocalhost%3A9000"));
    assert_eq!(*fakes.code.ports.lock().unwrap(), vec![9000]);

    let saved = store.get().expect("credentials saved");
    assert_eq!(saved.client_id, "client-id.apps.googleusercontent.com");
    assert_eq!(saved.refresh_token, "browser-refresh");
    assert_eq!(saved.email, "me@example.com");
}

#[tokio::test]
async fn manual_flow_uses_out_of_band_redirect() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("redirect_uri=urn%3Aietf%3Awg%3Aoauth%3A2.0%3Aoob"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "manual-access",
            "expires_in": 3600,
            "refresh_token": "manual-refresh"
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_tokeninfo(&server, "").await;

    let store = Arc::new(InMemoryCredentialStore::new());
    let fakes = Fakes::default();
    let provider = provider(store.clone(), &server, AuthSettings::default(), &fakes);

    let tokens = provider.get_token().await.expect("manual login");

    assert_eq!(tokens.access_token, "manual-access");
    assert_eq!(tokens.id_token, "");
    let urls = fakes.code.urls.lock().unwrap().clone();
    assert_eq!(urls.len(), 1);
    assert!(urls[0].contains("redirect_uri=urn%3Aietf%3Awg%3Aoauth%3A2.0%3Aoob"));
    assert_eq!(store.get().unwrap().refresh_token, "manual-refresh");
}

#[tokio::test]
async fn forced_reauth_keeps_refresh_token_when_omitted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "reauth-access",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_tokeninfo(&server, "saved@example.com").await;

    let store = Arc::new(InMemoryCredentialStore::seeded(saved_credentials(3600)));
    let settings = AuthSettings {
        force_reauth: true,
        ..AuthSettings::default()
    };
    let provider = provider(store.clone(), &server, settings, &Fakes::default());

    assert_eq!(provider.select().map(|s| s.name()), Some("manual"));
    provider.get_token().await.expect("re-authorized");

    let saved = store.get().unwrap();
    assert_eq!(saved.access_token, "reauth-access");
    assert_eq!(saved.refresh_token, "saved-refresh");
}

#[tokio::test]
async fn rejected_code_exchange_persists_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Malformed auth code."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryCredentialStore::new());
    let provider = provider(store.clone(), &server, AuthSettings::default(), &Fakes::default());

    let err = provider.get_token().await.expect_err("exchange must fail");

    assert!(matches!(err, AuthError::Rejected(ref m) if m == "Malformed auth code."));
    assert_eq!(store.save_count(), 0);
}

#[tokio::test]
async fn service_account_mode_uses_ambient_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryCredentialStore::seeded(saved_credentials(3600)));
    let settings = AuthSettings {
        service_account: true,
        ..AuthSettings::default()
    };
    let provider = provider(store.clone(), &server, settings, &Fakes::default());

    let tokens = provider.get_token().await.expect("adc token");

    assert_eq!(tokens, TokenPair::access_only("adc-access"));
    assert_eq!(store.save_count(), 0);
}

#[tokio::test]
async fn service_account_failure_does_not_fall_back() {
    let server = MockServer::start().await;
    let store = Arc::new(InMemoryCredentialStore::seeded(saved_credentials(3600)));
    let fakes = Fakes {
        adc: Arc::new(StaticAdc(Err("no credentials".to_string()))),
        ..Fakes::default()
    };
    let settings = AuthSettings {
        service_account: true,
        ..AuthSettings::default()
    };
    let provider = provider(store, &server, settings, &fakes);

    let err = provider.get_token().await.expect_err("adc must fail");

    assert!(matches!(err, AuthError::Authorization(_)));
}

#[tokio::test]
async fn saved_credentials_without_refresh_token_fail() {
    let server = MockServer::start().await;
    let mut creds = saved_credentials(-60);
    creds.refresh_token.clear();
    let store = Arc::new(InMemoryCredentialStore::seeded(creds));
    let provider = provider(store, &server, AuthSettings::default(), &Fakes::default());

    let err = provider.get_token().await.expect_err("no refresh token");

    assert!(matches!(err, AuthError::Authorization(_)));
}
