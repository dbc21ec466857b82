use clap::Parser;
use commands::{Cli, Commands};
use engine_core::StopFlag;
use engine_runtime::Orchestrator;
use error::CliError;
use shutdown::ShutdownCoordinator;
use std::process;
use tracing::{Level, info};

mod commands;
mod error;
mod shutdown;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let exit_code = match run_cli().await {
        Ok(()) => 0,
        Err(CliError::ShutdownRequested) => {
            info!("shutdown requested, exiting gracefully");
            130
        }
        Err(e) => {
            tracing::error!(error = %e, "replication run failed");
            1
        }
    };

    process::exit(exit_code);
}

async fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();

    let stop = StopFlag::new();
    let shutdown = ShutdownCoordinator::new(stop.token());
    shutdown.register_handlers();

    match cli.command {
        Commands::Import(args) => {
            let orchestrator = Orchestrator::connect(args.into(), stop.clone()).await?;
            orchestrator.import().await?;
            if shutdown.is_shutdown_requested() {
                return Err(CliError::ShutdownRequested);
            }
            info!("import complete");
        }
        Commands::Tail(args) => {
            let orchestrator = Orchestrator::connect(args.into(), stop.clone()).await?;
            orchestrator.optail().await?;
            if shutdown.is_shutdown_requested() {
                return Err(CliError::ShutdownRequested);
            }
        }
        Commands::Run(args) => {
            let orchestrator = Orchestrator::connect(args.into(), stop.clone()).await?;
            orchestrator.import().await?;
            if shutdown.is_shutdown_requested() {
                return Err(CliError::ShutdownRequested);
            }
            orchestrator.optail().await?;
            if shutdown.is_shutdown_requested() {
                return Err(CliError::ShutdownRequested);
            }
        }
    }

    Ok(())
}
