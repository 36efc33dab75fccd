use crate::{
    error::CliError,
    output::{print_state_list, print_state_table},
};
use engine_core::state::{SyncStateStore, sled_store::SledStateStore};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::info;

const DEFAULT_STATE_DIR: &str = ".docsync/state";

/// Flag, then config file, then `~/.docsync/state`.
pub fn resolve_state_dir(
    flag: Option<&Path>,
    configured: Option<&Path>,
) -> Result<PathBuf, CliError> {
    if let Some(dir) = flag.or(configured) {
        return Ok(dir.to_path_buf());
    }
    let home = dirs::home_dir().ok_or(CliError::NoHomeDir)?;
    Ok(home.join(DEFAULT_STATE_DIR))
}

pub fn open_state_store(path: &Path) -> Result<Arc<dyn SyncStateStore>, CliError> {
    let store = SledStateStore::open(path)?;
    info!(path = %path.display(), "Opened state store");
    Ok(Arc::new(store))
}

pub async fn show(
    store: &dyn SyncStateStore,
    connector: &str,
    datasource: &str,
    as_json: bool,
) -> Result<(), CliError> {
    let Some(state) = store.load(connector, datasource).await? else {
        println!("No watermark stored for connector '{connector}' / datasource '{datasource}'");
        return Ok(());
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        print_state_table(&state);
    }
    Ok(())
}

pub async fn list(store: &dyn SyncStateStore) -> Result<(), CliError> {
    let states = store.list().await?;
    print_state_list(&states);
    Ok(())
}

pub async fn reset(
    store: &dyn SyncStateStore,
    connector: &str,
    datasource: &str,
) -> Result<(), CliError> {
    store.clear(connector, datasource).await?;
    info!(connector, datasource, "Watermark cleared");
    println!("Cleared watermark for connector '{connector}' / datasource '{datasource}'");
    Ok(())
}
