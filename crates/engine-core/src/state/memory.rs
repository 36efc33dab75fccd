use crate::{error::StateStoreError, state::SyncStateStore};
use async_trait::async_trait;
use model::state::SyncState;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-local store, for tests and dry runs.
#[derive(Default)]
pub struct MemoryStateStore {
    states: RwLock<HashMap<(String, String), SyncState>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.states.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.states.read().await.is_empty()
    }
}

#[async_trait]
impl SyncStateStore for MemoryStateStore {
    async fn load(
        &self,
        connector_id: &str,
        datasource_id: &str,
    ) -> Result<Option<SyncState>, StateStoreError> {
        let key = (connector_id.to_string(), datasource_id.to_string());
        Ok(self.states.read().await.get(&key).cloned())
    }

    async fn save(&self, state: &SyncState) -> Result<(), StateStoreError> {
        let key = (state.connector_id.clone(), state.datasource_id.clone());
        self.states.write().await.insert(key, state.clone());
        Ok(())
    }

    async fn clear(&self, connector_id: &str, datasource_id: &str) -> Result<(), StateStoreError> {
        let key = (connector_id.to_string(), datasource_id.to_string());
        self.states.write().await.remove(&key);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SyncState>, StateStoreError> {
        Ok(self.states.read().await.values().cloned().collect())
    }
}
