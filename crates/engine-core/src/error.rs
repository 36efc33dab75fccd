use engine_config::error::ConfigError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CursorError {
    #[error("Cursor value is null")]
    Null,

    #[error("Unable to read `{value}` as {kind}")]
    Unparsable { value: String, kind: &'static str },

    #[error("Cursor value `{0}` is out of range")]
    OutOfRange(String),

    #[error("Cursor value `{0}` is not a finite number")]
    NonFinite(f64),

    #[error("Row has no value for cursor field `{0}`")]
    MissingField(String),
}

#[derive(Error, Debug)]
pub enum StateStoreError {
    #[error("State store backend error: {0}")]
    Backend(#[from] sled::Error),

    #[error("Failed to encode sync state: {0}")]
    Encode(serde_json::Error),

    #[error("Failed to decode sync state: {0}")]
    Decode(serde_json::Error),

    #[error("Invalid resume point: {0}")]
    InvalidResume(CursorError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("Mapped id column `{0}` is empty")]
    MissingId(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollectError {
    /// The document was refused; the scan carries on.
    #[error("Document rejected: {0}")]
    Rejected(String),

    /// The receiving side has gone away (e.g. the datasource was deleted).
    #[error("Collector stopped: {0}")]
    Stopped(String),
}

/// Failure of a source backend, kept opaque to the scan loop.
pub type SourceFailure = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Field `{field}` is not part of the fetched fields of `{entity}`")]
    MissingField { entity: String, field: String },

    #[error("No row of page {page} yields a watermark ({failures} of {rows} failed): {last}")]
    Decode {
        page: u64,
        rows: usize,
        failures: usize,
        last: CursorError,
    },

    #[error(
        "Watermark did not advance on page {page}: {candidate} is {} {previous}; \
         the tie-breaker is probably missing or not unique",
        relation(.regressed)
    )]
    Stagnation {
        page: u64,
        previous: String,
        candidate: String,
        regressed: bool,
    },

    #[error("Transform failed for {skipped} of {rows} rows on page {page}")]
    TransformThreshold { page: u64, rows: usize, skipped: usize },

    #[error("Source error: {0}")]
    Source(SourceFailure),

    #[error("State store error: {0}")]
    State(#[from] StateStoreError),

    #[error("Collector error: {0}")]
    Collector(CollectError),
}

fn relation(regressed: &bool) -> &'static str {
    if *regressed { "behind" } else { "equal to" }
}

impl ScanError {
    pub fn source(err: impl Into<SourceFailure>) -> Self {
        ScanError::Source(err.into())
    }

    /// Faults caused by configuration rather than by the source's data or
    /// availability; rerunning without a config change repeats them.
    pub fn is_fatal_config(&self) -> bool {
        matches!(
            self,
            ScanError::Config(_) | ScanError::MissingField { .. } | ScanError::Stagnation { .. }
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ScanError::Config(_) | ScanError::MissingField { .. } => "configuration",
            ScanError::Decode { .. } => "decode",
            ScanError::Stagnation { .. } => "stagnation",
            ScanError::TransformThreshold { .. } => "transform",
            ScanError::Source(_) => "source",
            ScanError::State(_) => "state",
            ScanError::Collector(_) => "collector",
        }
    }
}
