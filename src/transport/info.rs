use async_trait::async_trait;

use super::{Session, TransportDispatcher};
use crate::error::Result;

const RULE: &str = "************************************************************";

/// Prints the environment descriptor.
#[derive(Debug, Clone, Copy, Default)]
pub struct InfoDispatcher;

impl InfoDispatcher {
    pub fn render(&self, session: &Session) -> Result<String> {
        let env = &session.environment;
        let body = serde_json::to_string_pretty(env)?;
        let mut out = format!("{RULE}\nCloud Shell Info:\n{body}\n{RULE}\n");
        if let Some(target) = env.ssh_target() {
            out.push_str(&format!(
                "ssh -p {} {}\n",
                target.port,
                target.destination()
            ));
        }
        Ok(out)
    }
}

#[async_trait]
impl TransportDispatcher for InfoDispatcher {
    async fn dispatch(&self, session: &Session) -> Result<()> {
        print!("{}", self.render(session)?);
        Ok(())
    }
}
