use crate::error::ConfigError;
use model::{pagination::cursor::CursorKind, state::SyncMode};
use serde::{Deserialize, Serialize};

/// Incremental sync settings of one datasource.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct IncrementalConfig {
    pub enabled: bool,
    pub mode: String,
    pub property: String,
    pub property_type: CursorKind,
    pub tie_breaker: String,
    /// Literal starting point used while no watermark has been persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_from: Option<String>,
}

impl IncrementalConfig {
    /// Normalizes the settings in place. A disabled config is left as is.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }

        self.mode = self.mode.trim().to_ascii_lowercase();
        if self.mode.is_empty() {
            self.mode = SyncMode::PropertyWatermark.as_str().to_string();
        }
        if self.mode != SyncMode::PropertyWatermark.as_str() {
            return Err(ConfigError::UnsupportedMode(self.mode.clone()));
        }

        self.property = self.property.trim().to_string();
        if self.property.is_empty() {
            return Err(ConfigError::MissingIncrementalField("property"));
        }

        self.tie_breaker = self.tie_breaker.trim().to_string();
        if self.tie_breaker.is_empty() {
            return Err(ConfigError::MissingIncrementalField("tie_breaker"));
        }

        self.resume_from = self
            .resume_from
            .take()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Ok(())
    }
}
