use crate::pagination::cursor::StoredCursor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    #[default]
    PropertyWatermark,
}

impl SyncMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncMode::PropertyWatermark => "property_watermark",
        }
    }
}

/// Persisted sync progress of one datasource. There is exactly one record
/// per `(connector_id, datasource_id)`; saving overwrites it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SyncState {
    pub connector_id: String,
    pub datasource_id: String,
    pub mode: SyncMode,
    pub property: String,
    pub cursor: StoredCursor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}
