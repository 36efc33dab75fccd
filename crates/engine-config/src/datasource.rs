use crate::{error::ConfigError, incremental::IncrementalConfig, source::SourceConfig};
use model::transform::mapping::FieldMappingConfig;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 500;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PaginationConfig {
    pub enabled: bool,
    pub page_size: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PaginationConfig {
    /// Rows per fetch, or `None` when every fetch reads everything.
    pub fn page_size(&self) -> Option<usize> {
        self.enabled.then_some(self.page_size)
    }
}

/// Fault tolerance of a scan, as fractions of a page.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ScanPolicy {
    /// A page fails once this share of its rows cannot yield a watermark.
    /// A page where no row yields one always fails.
    pub decode_failure_threshold: f64,
    /// A page fails once more than this share of its rows cannot be
    /// transformed into documents.
    pub transform_failure_threshold: f64,
}

impl Default for ScanPolicy {
    fn default() -> Self {
        Self {
            decode_failure_threshold: 1.0,
            transform_failure_threshold: 0.5,
        }
    }
}

impl ScanPolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("decode_failure_threshold", self.decode_failure_threshold),
            ("transform_failure_threshold", self.transform_failure_threshold),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::InvalidThreshold { name, value });
            }
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DatasourceConfig {
    pub connector_id: String,
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub source: SourceConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub incremental: IncrementalConfig,
    #[serde(default)]
    pub field_mapping: FieldMappingConfig,
    #[serde(default)]
    pub policy: ScanPolicy,
}

impl DatasourceConfig {
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.connector_id.trim().is_empty() {
            return Err(ConfigError::MissingField(self.id.clone(), "connector_id"));
        }
        if self.id.trim().is_empty() {
            return Err(ConfigError::MissingField(self.name.clone(), "id"));
        }
        if self.name.is_empty() {
            self.name = self.id.clone();
        }
        if self.source.connection_uri().trim().is_empty() {
            return Err(ConfigError::MissingField(self.id.clone(), "connection_uri"));
        }
        if self.pagination.enabled && self.pagination.page_size == 0 {
            return Err(ConfigError::InvalidPageSize);
        }
        if self.field_mapping.enabled && self.field_mapping.mapping.is_none() {
            return Err(ConfigError::EmptyMapping);
        }
        self.policy.validate()?;
        self.incremental.validate()
    }

    /// Incremental settings, when incremental sync is switched on.
    pub fn incremental(&self) -> Option<&IncrementalConfig> {
        self.incremental.enabled.then_some(&self.incremental)
    }
}
