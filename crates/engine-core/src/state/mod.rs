use crate::error::StateStoreError;
use async_trait::async_trait;
use model::state::SyncState;

pub mod manager;
pub mod memory;
pub mod sled_store;

/// Durable sync progress, one record per `(connector, datasource)`.
#[async_trait]
pub trait SyncStateStore: Send + Sync {
    async fn load(
        &self,
        connector_id: &str,
        datasource_id: &str,
    ) -> Result<Option<SyncState>, StateStoreError>;

    /// Overwrites the record of the state's pair.
    async fn save(&self, state: &SyncState) -> Result<(), StateStoreError>;

    /// Removes the record of the pair; removing a missing record succeeds.
    async fn clear(&self, connector_id: &str, datasource_id: &str) -> Result<(), StateStoreError>;

    async fn list(&self) -> Result<Vec<SyncState>, StateStoreError>;
}
