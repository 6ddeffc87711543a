use std::sync::Arc;

use super::{Cli, Commands};
use crate::auth::{
    standard_strategies, ApplicationDefaultCredentials, AuthContext, FileCredentialStore,
    LoopbackReceiver, OAuthClient, StdinPrompt, SystemBrowser, TokenProvider,
};
use crate::config::CloudShellConfig;
use crate::environment::{CloudShellClient, EnvironmentOrchestrator};
use crate::error::{CloudShellError, Result};
use crate::transport::{
    default_key_path, InfoDispatcher, ScpDispatcher, Session, SshDispatcher, Transfer,
    TransportDispatcher,
};

/// Authenticate, bring the environment up and hand it to the chosen transport.
pub async fn run(cli: Cli) -> Result<()> {
    let config = CloudShellConfig::load(cli.overrides())?;
    let command = cli.command();
    // resolve the transport before any network traffic so bad paths fail fast
    let dispatcher = dispatcher_for(&command)?;

    let provider = token_provider(config.clone());
    let tokens = provider.get_token().await?;
    tracing::debug!(project = %config.project_id, "obtained access token");

    let mut client = CloudShellClient::new(config.project_id.clone());
    if let Some(url) = &config.environment_url {
        client = client.with_environment_url(url.clone());
    }
    let orchestrator = EnvironmentOrchestrator::new(Arc::new(client));

    let environment = match command {
        Commands::Info => orchestrator.inspect(&tokens.access_token).await?,
        _ => orchestrator.ensure_running(&tokens.access_token).await?,
    };

    let session = Session::new(tokens.access_token, environment);
    dispatcher.dispatch(&session).await
}

fn token_provider(config: CloudShellConfig) -> TokenProvider {
    let mut oauth = OAuthClient::new();
    if let Some(url) = &config.token_url {
        oauth = oauth.with_token_url(url.clone());
    }
    if let Some(url) = &config.tokeninfo_url {
        oauth = oauth.with_tokeninfo_url(url.clone());
    }

    let ctx = AuthContext {
        store: Arc::new(FileCredentialStore::new(config.credentials_path)),
        oauth: oauth.clone(),
        settings: config.auth,
        client_secrets: config.client_secrets,
        client_secrets_path: config.client_secrets_path,
    };
    let strategies = standard_strategies(
        Arc::new(ApplicationDefaultCredentials::new(oauth)),
        Arc::new(SystemBrowser),
        Arc::new(LoopbackReceiver),
        Arc::new(StdinPrompt),
    );
    TokenProvider::new(ctx, strategies)
}

fn dispatcher_for(command: &Commands) -> Result<Box<dyn TransportDispatcher>> {
    let key = || {
        default_key_path().ok_or_else(|| {
            CloudShellError::Configuration("cannot determine the home directory".into())
        })
    };
    Ok(match command {
        Commands::Info => Box::new(InfoDispatcher),
        Commands::Ssh => Box::new(SshDispatcher::interactive(key()?)),
        Commands::Exec { command } => Box::new(SshDispatcher::exec(key()?, command.clone())),
        Commands::Upload { src, dst } => Box::new(ScpDispatcher::new(
            key()?,
            Transfer::upload(src, dst.clone())?,
        )),
        Commands::Download { src, dst } => Box::new(ScpDispatcher::new(
            key()?,
            Transfer::download(src, dst.clone())?,
        )),
    })
}
