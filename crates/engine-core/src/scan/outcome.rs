use crate::metrics::ScanMetricsSnapshot;
use model::pagination::cursor::StoredCursor;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    Completed,
    /// Stopped on request; the last persisted watermark stays valid.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanOutcome {
    pub connector_id: String,
    pub datasource_id: String,
    pub status: ScanStatus,
    #[serde(flatten)]
    pub metrics: ScanMetricsSnapshot,
    /// Watermark persisted by this scan's last advancing page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watermark: Option<StoredCursor>,
}

impl ScanOutcome {
    pub fn is_cancelled(&self) -> bool {
        self.status == ScanStatus::Cancelled
    }
}
