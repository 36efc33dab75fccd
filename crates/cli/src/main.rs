use crate::{
    commands::{Commands, StateCommand},
    error::CliError,
    run::RunArgs,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use connectors::adapter::Adapter;
use engine_config::sync::SyncConfig;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod output;
mod run;
mod shutdown;
mod state;

#[derive(Parser)]
#[command(name = "docsync", version = "0.1.0", about = "Cursor-based incremental sync")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries documents.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let shutdown = ShutdownCoordinator::new(CancellationToken::new());
    shutdown.register_handlers();

    let code = match execute(cli.command, &shutdown).await {
        Ok(code) => code,
        Err(err) => {
            error!(%err, "Command failed");
            ExitCode::GeneralError
        }
    };
    std::process::exit(code.as_i32());
}

async fn execute(command: Commands, shutdown: &ShutdownCoordinator) -> Result<ExitCode, CliError> {
    match command {
        Commands::Run {
            config,
            state_dir,
            output,
            datasource,
        } => {
            let args = RunArgs {
                config,
                state_dir,
                output,
                datasource,
            };
            return run::run(args, shutdown).await;
        }
        Commands::State { state_dir, command } => {
            let dir = state::resolve_state_dir(state_dir.as_deref(), None)?;
            let store = state::open_state_store(&dir)?;
            match command {
                StateCommand::Show {
                    connector,
                    datasource,
                    json,
                } => state::show(store.as_ref(), &connector, &datasource, json).await?,
                StateCommand::List => state::list(store.as_ref()).await?,
                StateCommand::Reset {
                    connector,
                    datasource,
                } => state::reset(store.as_ref(), &connector, &datasource).await?,
            }
        }
        Commands::Validate { config } => {
            let config = load_config(&config).await?;
            println!("Configuration is valid ({} datasources)", config.datasources.len());
            for ds in &config.datasources {
                let mode = match ds.incremental() {
                    Some(inc) => format!("incremental on {} ({})", inc.property, inc.property_type),
                    None => "full".to_string(),
                };
                println!(
                    "  {}/{} [{}] {}",
                    ds.connector_id,
                    ds.id,
                    ds.source.kind(),
                    mode
                );
            }
        }
        Commands::Probe { config, datasource } => {
            let config = load_config(&config).await?;
            let ds = config
                .datasource(&datasource)
                .ok_or_else(|| CliError::UnknownDatasource(datasource.clone()))?;
            info!(datasource = %ds.id, source = ds.source.kind(), "Probing source");
            match Adapter::from_config(&ds.source)?.probe().await? {
                Some(schema) => println!("{}: {}", schema.entity, schema.fields.join(", ")),
                None => println!("Source reachable; fields are not known before reading"),
            }
        }
    }
    Ok(ExitCode::Success)
}

async fn load_config(path: &Path) -> Result<SyncConfig, CliError> {
    let mut config = SyncConfig::from_file(path).await?;
    config.validate()?;
    Ok(config)
}
