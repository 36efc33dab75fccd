use crate::{datasource::DatasourceConfig, error::ConfigError};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, path::Path, path::PathBuf};
use tracing::info;

/// Top-level configuration file.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SyncConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
    #[serde(default)]
    pub datasources: Vec<DatasourceConfig>,
}

impl SyncConfig {
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = tokio::fs::read_to_string(path).await?;
        let config = Self::from_json(&source)?;
        info!(
            path = %path.display(),
            datasources = config.datasources.len(),
            "Loaded sync configuration"
        );
        Ok(config)
    }

    /// Parses and validates a configuration document.
    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        let mut config: SyncConfig = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&mut self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for ds in &mut self.datasources {
            ds.validate()?;
            if !seen.insert((ds.connector_id.clone(), ds.id.clone())) {
                return Err(ConfigError::DuplicateDatasource {
                    connector: ds.connector_id.clone(),
                    datasource: ds.id.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn datasource(&self, id: &str) -> Option<&DatasourceConfig> {
        self.datasources.iter().find(|ds| ds.id == id)
    }
}
