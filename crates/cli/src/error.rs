use connectors::error::SourceError;
use engine_config::error::ConfigError;
use engine_core::error::StateStoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("State store error: {0}")]
    State(#[from] StateStoreError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("Datasource '{0}' is not configured")]
    UnknownDatasource(String),

    #[error("Could not determine home directory for the state store")]
    NoHomeDir,

    #[error("Scan task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
