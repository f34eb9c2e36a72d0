use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use vigil::{
    app,
    cli::{handle_recordings_command, handle_status_command, Cli, CliCommand},
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Some(CliCommand::Version) => {
            println!("vigil {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Some(CliCommand::Status) => {
            handle_status_command().await?;
            return Ok(());
        }
        Some(CliCommand::Recordings) => {
            handle_recordings_command().await?;
            return Ok(());
        }
        None => {}
    }

    app::run_service().await
}
