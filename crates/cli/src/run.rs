use crate::{
    error::CliError,
    output::{self, ScanResult},
    shutdown::{ExitCode, ShutdownCoordinator},
    state::{open_state_store, resolve_state_dir},
};
use connectors::adapter::scan_datasource;
use engine_config::{datasource::DatasourceConfig, sync::SyncConfig};
use engine_core::{collect::ChannelCollector, scan::ScanContext};
use futures_util::future::join_all;
use std::{path::PathBuf, sync::Arc};
use tracing::{info, warn};

const DOCUMENT_BUFFER: usize = 1024;

pub struct RunArgs {
    pub config: PathBuf,
    pub state_dir: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub datasource: Option<String>,
}

/// Scans the selected datasources concurrently into one document stream.
pub async fn run(args: RunArgs, shutdown: &ShutdownCoordinator) -> Result<ExitCode, CliError> {
    let mut config = SyncConfig::from_file(&args.config).await?;
    config.validate()?;

    let selected = select(&config, args.datasource.as_deref())?;
    let state_dir = resolve_state_dir(args.state_dir.as_deref(), config.state_dir.as_deref())?;
    let store = open_state_store(&state_dir)?;

    let (collector, rx) = ChannelCollector::channel(DOCUMENT_BUFFER);
    let writer = tokio::spawn(output::write_documents(rx, args.output));
    let ctx = ScanContext {
        store,
        collector: Arc::new(collector),
        cancel: shutdown.cancel_token(),
    };

    info!(datasources = selected.len(), "Starting sync run");
    let tasks = selected.into_iter().map(|datasource| {
        let ctx = ctx.clone();
        let guard = shutdown.track(&datasource.connector_id, &datasource.id);
        tokio::spawn(async move {
            let _guard = guard;
            let key = (datasource.connector_id.clone(), datasource.id.clone());
            (key, scan_datasource(datasource, ctx).await)
        })
    });
    let joined = join_all(tasks).await;
    // The writer finishes once the last collector clone is gone.
    drop(ctx);

    let mut results: Vec<ScanResult> = Vec::with_capacity(joined.len());
    for result in joined {
        results.push(result?);
    }
    let written = writer.await??;
    info!(documents = written, "Sync run finished");

    output::print_summary(&results);
    Ok(exit_code(&results, shutdown.is_shutdown_requested()))
}

fn select(config: &SyncConfig, id: Option<&str>) -> Result<Vec<DatasourceConfig>, CliError> {
    match id {
        Some(id) => config
            .datasource(id)
            .cloned()
            .map(|ds| vec![ds])
            .ok_or_else(|| CliError::UnknownDatasource(id.to_string())),
        None => Ok(config.datasources.clone()),
    }
}

fn exit_code(results: &[ScanResult], interrupted: bool) -> ExitCode {
    let cancelled = results
        .iter()
        .any(|(_, r)| matches!(r, Ok(outcome) if outcome.is_cancelled()));
    if interrupted || cancelled {
        return ExitCode::ShutdownRequested;
    }
    let failed = results.iter().filter(|(_, r)| r.is_err()).count();
    if failed > 0 {
        warn!(failed, "Some datasources failed");
        return ExitCode::GeneralError;
    }
    ExitCode::Success
}
