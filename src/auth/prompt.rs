//! Manual (out-of-band) verification code entry.

use std::io::Write;

use async_trait::async_trait;

use super::error::AuthError;

/// Shows the authorization URL and collects the code the operator pastes back.
#[async_trait]
pub trait CodePrompt: Send + Sync {
    async fn read_code(&self, authorize_url: &str) -> Result<String, AuthError>;
}

/// Prompts on stdout and reads a single line from stdin, without a timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinPrompt;

#[async_trait]
impl CodePrompt for StdinPrompt {
    async fn read_code(&self, authorize_url: &str) -> Result<String, AuthError> {
        println!("Go to the following link in your browser:");
        println!();
        println!("{authorize_url}");
        println!();
        print!("Enter verification code: ");
        std::io::stdout().flush()?;

        let line = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            std::io::stdin().read_line(&mut line).map(|_| line)
        })
        .await
        .map_err(|err| AuthError::Io(err.to_string()))??;

        let code = line.trim();
        if code.is_empty() {
            return Err(AuthError::Authorization(
                "no verification code entered".to_string(),
            ));
        }
        Ok(code.to_string())
    }
}
