use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read the configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse the configuration file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Incremental sync requires `{0}` to be set")]
    MissingIncrementalField(&'static str),

    #[error("Unsupported incremental mode: {0}")]
    UnsupportedMode(String),

    #[error("Page size must be greater than zero")]
    InvalidPageSize,

    #[error("Threshold `{name}` must be within (0, 1], got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("Field mapping is enabled but no mapping is configured")]
    EmptyMapping,

    #[error("Datasource `{0}` is missing `{1}`")]
    MissingField(String, &'static str),

    #[error("Datasource `{datasource}` of connector `{connector}` is configured more than once")]
    DuplicateDatasource {
        connector: String,
        datasource: String,
    },
}
