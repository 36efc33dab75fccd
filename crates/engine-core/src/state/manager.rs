use crate::{
    cursor::{CursorSerializer, CursorWatermark},
    error::StateStoreError,
    state::SyncStateStore,
};
use chrono::Utc;
use engine_config::incremental::IncrementalConfig;
use model::state::{SyncMode, SyncState};
use std::sync::Arc;
use tracing::{info, warn};

/// Loads and saves the watermark of one datasource. This is the only
/// place that interprets the stored record.
#[derive(Clone)]
pub struct CursorStateManager {
    store: Arc<dyn SyncStateStore>,
    connector_id: String,
    datasource_id: String,
    serializer: CursorSerializer,
}

impl CursorStateManager {
    pub fn new(
        store: Arc<dyn SyncStateStore>,
        connector_id: impl Into<String>,
        datasource_id: impl Into<String>,
        serializer: CursorSerializer,
    ) -> Self {
        Self {
            store,
            connector_id: connector_id.into(),
            datasource_id: datasource_id.into(),
            serializer,
        }
    }

    pub fn connector_id(&self) -> &str {
        &self.connector_id
    }

    pub fn datasource_id(&self) -> &str {
        &self.datasource_id
    }

    /// The persisted watermark for `property`. A record written for another
    /// property, or one that no longer reads as the configured type, is
    /// ignored so the next scan starts over.
    pub async fn load(&self, property: &str) -> Result<Option<CursorWatermark>, StateStoreError> {
        let Some(state) = self
            .store
            .load(&self.connector_id, &self.datasource_id)
            .await?
        else {
            return Ok(None);
        };

        if state.connector_id != self.connector_id || state.datasource_id != self.datasource_id {
            warn!(
                connector = %self.connector_id,
                datasource = %self.datasource_id,
                stored_connector = %state.connector_id,
                stored_datasource = %state.datasource_id,
                "Stored watermark belongs to another datasource, ignoring it"
            );
            return Ok(None);
        }

        if state.property != property {
            info!(
                connector = %self.connector_id,
                datasource = %self.datasource_id,
                stored = %state.property,
                configured = %property,
                "Watermark property changed, starting a full pass"
            );
            return Ok(None);
        }

        match self.serializer.from_stored(state.cursor) {
            Ok(watermark) => Ok(Some(watermark)),
            Err(error) => {
                warn!(
                    connector = %self.connector_id,
                    datasource = %self.datasource_id,
                    %error,
                    "Stored watermark does not match the configured property type, ignoring it"
                );
                Ok(None)
            }
        }
    }

    /// The persisted watermark, else the configured `resume_from` point.
    pub async fn load_with_fallback(
        &self,
        cfg: &IncrementalConfig,
    ) -> Result<Option<CursorWatermark>, StateStoreError> {
        if let Some(watermark) = self.load(&cfg.property).await? {
            return Ok(Some(watermark));
        }

        let Some(resume) = cfg.resume_from.as_deref() else {
            return Ok(None);
        };
        let watermark = self
            .serializer
            .from_resume(resume)
            .map_err(StateStoreError::InvalidResume)?;
        if let Some(wm) = &watermark {
            info!(
                connector = %self.connector_id,
                datasource = %self.datasource_id,
                resume_from = %wm.stored(),
                "No stored watermark, resuming from configured point"
            );
        }
        Ok(watermark)
    }

    /// Overwrites the stored watermark. Saving nothing is a no-op.
    pub async fn save(
        &self,
        property: &str,
        watermark: Option<&CursorWatermark>,
    ) -> Result<(), StateStoreError> {
        let Some(watermark) = watermark else {
            return Ok(());
        };

        let state = SyncState {
            connector_id: self.connector_id.clone(),
            datasource_id: self.datasource_id.clone(),
            mode: SyncMode::PropertyWatermark,
            property: property.to_string(),
            cursor: watermark.stored().clone(),
            updated_at: Some(Utc::now()),
        };
        self.store.save(&state).await
    }

    pub async fn clear(&self) -> Result<(), StateStoreError> {
        self.store
            .clear(&self.connector_id, &self.datasource_id)
            .await
    }
}
