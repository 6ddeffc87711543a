use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::types::{EnvironmentDescriptor, ServerError};
use crate::error::{CloudShellError, Result};

pub const DEFAULT_ENVIRONMENT_URL: &str =
    "https://cloudshell.googleapis.com/v1alpha1/users/me/environments/default";

/// Calls against the operator's default Cloud Shell environment.
#[async_trait]
pub trait EnvironmentClient: Send + Sync {
    async fn get_environment(&self, access_token: &str) -> Result<EnvironmentDescriptor>;
    async fn start_environment(&self, access_token: &str) -> Result<()>;
}

/// HTTP client for the Cloud Shell REST API.
///
/// An error object embedded in a parsed body becomes
/// [`CloudShellError::Environment`]; transport failures stay
/// [`CloudShellError::Network`].
#[derive(Debug, Clone)]
pub struct CloudShellClient {
    client: reqwest::Client,
    environment_url: String,
    project_id: String,
}

impl CloudShellClient {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            environment_url: DEFAULT_ENVIRONMENT_URL.to_string(),
            project_id: project_id.into(),
        }
    }

    pub fn with_environment_url(mut self, url: impl Into<String>) -> Self {
        self.environment_url = url.into();
        self
    }

    fn request(
        &self,
        builder: reqwest::RequestBuilder,
        access_token: &str,
    ) -> reqwest::RequestBuilder {
        let builder = builder
            .bearer_auth(access_token)
            .header("Accept", "application/json")
            .query(&[("alt", "json")]);
        if self.project_id.is_empty() {
            builder
        } else {
            builder.header("X-Goog-User-Project", &self.project_id)
        }
    }
}

#[async_trait]
impl EnvironmentClient for CloudShellClient {
    async fn get_environment(&self, access_token: &str) -> Result<EnvironmentDescriptor> {
        let resp = self
            .request(self.client.get(&self.environment_url), access_token)
            .send()
            .await?;
        let env: EnvironmentDescriptor = read_body(resp).await?;
        if let Some(err) = env.server_error() {
            return Err(server_error(err));
        }
        tracing::debug!(state = %env.state, "fetched Cloud Shell environment");
        Ok(env)
    }

    async fn start_environment(&self, access_token: &str) -> Result<()> {
        tracing::debug!("requesting users.environments.start");
        let url = format!("{}:start", self.environment_url);
        let resp = self
            .request(self.client.post(url), access_token)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        let operation: Operation = read_body(resp).await?;
        if let Some(err) = operation.error.as_ref().filter(|err| err.code != 0) {
            return Err(server_error(err));
        }
        Ok(())
    }
}

/// Long-running operation returned by `:start`; only the error matters here.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Operation {
    error: Option<ServerError>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ServerError,
}

async fn read_body<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    let body = resp.bytes().await?;
    if !status.is_success() {
        return Err(status_error(status, &body));
    }
    serde_json::from_slice(&body)
        .map_err(|err| CloudShellError::Parse(format!("cannot parse Cloud Shell response: {err}")))
}

fn status_error(status: StatusCode, body: &[u8]) -> CloudShellError {
    match serde_json::from_slice::<ErrorEnvelope>(body) {
        Ok(envelope) if envelope.error.code != 0 => server_error(&envelope.error),
        _ => CloudShellError::environment(
            i32::from(status.as_u16()),
            status.canonical_reason().unwrap_or("UNKNOWN"),
            format!("Cloud Shell API returned status {status}"),
        ),
    }
}

fn server_error(err: &ServerError) -> CloudShellError {
    CloudShellError::environment(err.code, err.status.clone(), err.message.clone())
}
