use crate::{error::StateStoreError, state::SyncStateStore};
use async_trait::async_trait;
use model::state::SyncState;
use std::path::Path;

const KEY_PREFIX: &str = "sync:";

pub struct SledStateStore {
    db: sled::Db,
}

impl SledStateStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StateStoreError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// `sync:` + connector length (u32 BE) + connector + datasource. The
    /// length prefix keeps ids containing `:` from sharing a key.
    #[inline]
    fn state_key(connector_id: &str, datasource_id: &str) -> Vec<u8> {
        let mut key = Vec::with_capacity(KEY_PREFIX.len() + 4 + connector_id.len() + datasource_id.len());
        key.extend_from_slice(KEY_PREFIX.as_bytes());
        key.extend_from_slice(&(connector_id.len() as u32).to_be_bytes());
        key.extend_from_slice(connector_id.as_bytes());
        key.extend_from_slice(datasource_id.as_bytes());
        key
    }
}

#[async_trait]
impl SyncStateStore for SledStateStore {
    async fn load(
        &self,
        connector_id: &str,
        datasource_id: &str,
    ) -> Result<Option<SyncState>, StateStoreError> {
        let key = Self::state_key(connector_id, datasource_id);
        let Some(bytes) = self.db.get(key)? else {
            return Ok(None);
        };
        let state: SyncState = serde_json::from_slice(&bytes).map_err(StateStoreError::Decode)?;
        if state.connector_id != connector_id || state.datasource_id != datasource_id {
            return Ok(None);
        }
        Ok(Some(state))
    }

    async fn save(&self, state: &SyncState) -> Result<(), StateStoreError> {
        let key = Self::state_key(&state.connector_id, &state.datasource_id);
        let bytes = serde_json::to_vec(state).map_err(StateStoreError::Encode)?;
        self.db.insert(key, bytes)?;
        // Progress must survive a crash right after the page it describes.
        self.db.flush()?;
        Ok(())
    }

    async fn clear(&self, connector_id: &str, datasource_id: &str) -> Result<(), StateStoreError> {
        self.db.remove(Self::state_key(connector_id, datasource_id))?;
        self.db.flush()?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SyncState>, StateStoreError> {
        let mut states = Vec::new();
        for item in self.db.scan_prefix(KEY_PREFIX) {
            let (_key, value) = item?;
            states.push(serde_json::from_slice(&value).map_err(StateStoreError::Decode)?);
        }
        Ok(states)
    }
}
