use std::sync::Arc;
use std::time::Duration;

use super::client::EnvironmentClient;
use super::types::{EnvironmentDescriptor, EnvironmentState};
use crate::error::{CloudShellError, Result};

/// Polling budget for bringing an environment up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_polls: u32,
    /// Sleep before every re-fetch.
    pub interval: Duration,
    /// Wait after `RUNNING` is first observed, before handing off to a transport.
    pub settle_delay: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_polls: 60,
            interval: Duration::from_millis(500),
            settle_delay: Duration::from_secs(5),
        }
    }
}

/// Drives the environment to `RUNNING`.
///
/// ```text
/// get ──RUNNING────────────────────────────────────▶ done
///  │
///  ├─DISABLED─▶ start (once) ─▶ poll ≤60× ──RUNNING──▶ settle ▶ done
///  │                              │
///  │                              ├─server error──▶ Environment error
///  │                              └─budget spent──▶ Timeout(last state)
///  └─other──────────────────────────────────────────▶ Unavailable(state)
/// ```
pub struct EnvironmentOrchestrator {
    client: Arc<dyn EnvironmentClient>,
    policy: PollPolicy,
}

impl EnvironmentOrchestrator {
    pub fn new(client: Arc<dyn EnvironmentClient>) -> Self {
        Self {
            client,
            policy: PollPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Fetch the environment once, without changing it.
    pub async fn inspect(&self, access_token: &str) -> Result<EnvironmentDescriptor> {
        self.client.get_environment(access_token).await
    }

    /// Return a running environment, starting it if it is disabled.
    ///
    /// Any other non-running state is reported as [`CloudShellError::Unavailable`]
    /// without polling.
    pub async fn ensure_running(&self, access_token: &str) -> Result<EnvironmentDescriptor> {
        let env = self.client.get_environment(access_token).await?;
        match env.state {
            EnvironmentState::Running => return Ok(env),
            EnvironmentState::Disabled => {
                tracing::info!("Cloud Shell is disabled; starting it");
                self.client.start_environment(access_token).await?;
            }
            _ => {
                tracing::debug!(state = %env.state, "Cloud Shell is neither running nor disabled");
                return Err(CloudShellError::Unavailable(env.state));
            }
        }
        self.poll_until_running(access_token, env.state).await
    }

    async fn poll_until_running(
        &self,
        access_token: &str,
        mut last_state: EnvironmentState,
    ) -> Result<EnvironmentDescriptor> {
        for poll in 1..=self.policy.max_polls {
            tokio::time::sleep(self.policy.interval).await;
            let env = self.client.get_environment(access_token).await?;
            tracing::debug!(poll, state = %env.state, "polled Cloud Shell");
            if env.is_running() {
                tokio::time::sleep(self.policy.settle_delay).await;
                return Ok(env);
            }
            last_state = env.state;
        }
        Err(CloudShellError::Timeout {
            polls: self.policy.max_polls,
            last_state,
        })
    }
}
