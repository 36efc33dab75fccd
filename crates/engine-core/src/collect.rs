use crate::error::CollectError;
use async_trait::async_trait;
use model::records::document::Document;
use tokio::sync::mpsc;

/// Receives every document a scan produces, one call per row.
#[async_trait]
pub trait Collector: Send + Sync {
    async fn collect(&self, document: Document) -> Result<(), CollectError>;
}

/// Forwards documents into a bounded channel. Once the receiver is gone
/// the collector reports [`CollectError::Stopped`].
#[derive(Clone)]
pub struct ChannelCollector {
    tx: mpsc::Sender<Document>,
}

impl ChannelCollector {
    pub fn new(tx: mpsc::Sender<Document>) -> Self {
        Self { tx }
    }

    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Document>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl Collector for ChannelCollector {
    async fn collect(&self, document: Document) -> Result<(), CollectError> {
        self.tx
            .send(document)
            .await
            .map_err(|_| CollectError::Stopped("document receiver closed".to_string()))
    }
}
