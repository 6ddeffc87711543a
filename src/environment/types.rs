use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state reported by the Cloud Shell API.
///
/// The server sends a free-form string; values this crate does not know are
/// kept verbatim in [`EnvironmentState::Other`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EnvironmentState {
    #[default]
    Unspecified,
    Disabled,
    Starting,
    Running,
    Other(String),
}

impl EnvironmentState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Unspecified => "STATE_UNSPECIFIED",
            Self::Disabled => "DISABLED",
            Self::Starting => "STARTING",
            Self::Running => "RUNNING",
            Self::Other(value) => value,
        }
    }
}

impl From<String> for EnvironmentState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "" | "STATE_UNSPECIFIED" => Self::Unspecified,
            "DISABLED" => Self::Disabled,
            "STARTING" => Self::Starting,
            "RUNNING" => Self::Running,
            _ => Self::Other(value),
        }
    }
}

impl From<EnvironmentState> for String {
    fn from(state: EnvironmentState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for EnvironmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error object embedded in Google API response bodies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerError {
    pub code: i32,
    pub message: String,
    pub status: String,
}

/// `users.environments` resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnvironmentDescriptor {
    pub name: String,
    pub id: String,
    pub docker_image: String,
    pub state: EnvironmentState,
    pub ssh_username: String,
    pub ssh_host: String,
    pub ssh_port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ServerError>,
}

impl EnvironmentDescriptor {
    /// The embedded server error, if one with a non-zero code is present.
    pub fn server_error(&self) -> Option<&ServerError> {
        self.error.as_ref().filter(|err| err.code != 0)
    }

    pub fn is_running(&self) -> bool {
        self.state == EnvironmentState::Running
    }

    /// Connection details, available only while the environment is running.
    pub fn ssh_target(&self) -> Option<SshTarget> {
        self.is_running().then(|| SshTarget {
            username: self.ssh_username.clone(),
            host: self.ssh_host.clone(),
            port: self.ssh_port,
        })
    }
}

/// What a transport needs to reach a running environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    pub username: String,
    pub host: String,
    pub port: u16,
}

impl SshTarget {
    pub fn destination(&self) -> String {
        format!("{}@{}", self.username, self.host)
    }
}
