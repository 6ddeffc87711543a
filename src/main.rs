//! cloudshell binary entry point.

use clap::Parser;
use cloudshell::cli::{format_error_help, init_logging, run, Cli};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging(cli.log_filter(), cli.json_logs);
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "cloudshell starting");

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", format_error_help(&e));
        std::process::exit(1);
    }
}
