//! The operator's Cloud Shell environment: wire types, the REST client and
//! the start-and-poll state machine.

mod client;
mod orchestrator;
mod types;

pub use client::{CloudShellClient, EnvironmentClient, DEFAULT_ENVIRONMENT_URL};
pub use orchestrator::{EnvironmentOrchestrator, PollPolicy};
pub use types::{EnvironmentDescriptor, EnvironmentState, ServerError, SshTarget};
