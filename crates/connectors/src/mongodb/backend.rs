use super::{
    convert::document_to_row,
    filter::{base_filter, cursor_filter, cursor_sort},
};
use crate::error::SourceError;
use async_trait::async_trait;
use engine_config::source::MongoSourceConfig;
use engine_core::scan::{PageRequest, SourceBackend, SourceSchema};
use model::records::row::RowData;
use mongodb::{
    Client, Collection,
    bson::{Document, doc},
    options::{ClientOptions, FindOptions},
};
use tracing::debug;

const APP_NAME: &str = "docsync";

/// A prepared `find`.
#[derive(Debug, Clone)]
pub struct MongoFind {
    pub filter: Document,
    pub options: FindOptions,
}

/// Scans one collection; incremental pages filter on the watermark instead
/// of skipping.
pub struct MongoBackend {
    config: MongoSourceConfig,
    filter: Document,
    client: Option<Client>,
    collection: Option<Collection<Document>>,
}

impl MongoBackend {
    pub fn new(config: MongoSourceConfig) -> Result<Self, SourceError> {
        let filter = base_filter(config.filter.as_ref())?;
        Ok(Self {
            config,
            filter,
            client: None,
            collection: None,
        })
    }

    fn projection(&self) -> Option<Document> {
        if self.config.projection.is_empty() {
            return None;
        }
        let mut projection = Document::new();
        for field in &self.config.projection {
            projection.insert(field.as_str(), 1);
        }
        Some(projection)
    }
}

#[async_trait]
impl SourceBackend for MongoBackend {
    type Fetch = MongoFind;
    type Error = SourceError;

    fn name(&self) -> &str {
        "mongodb"
    }

    async fn connect(&mut self) -> Result<(), SourceError> {
        let mut options = ClientOptions::parse(&self.config.connection_uri).await?;
        options.app_name = Some(APP_NAME.to_string());
        let client = Client::with_options(options)?;
        self.collection = Some(
            client
                .database(&self.config.database)
                .collection::<Document>(&self.config.collection),
        );
        self.client = Some(client);
        Ok(())
    }

    /// Only a projection pins the field list; whole documents can carry
    /// any field.
    async fn describe_schema(&mut self) -> Result<Option<SourceSchema>, SourceError> {
        if self.config.projection.is_empty() {
            return Ok(None);
        }
        let mut fields = self.config.projection.clone();
        if !fields.iter().any(|f| f == "_id") {
            fields.push("_id".to_string());
        }
        Ok(Some(SourceSchema::new(self.config.collection.clone(), fields)))
    }

    fn build_fetch(&self, request: &PageRequest<'_>) -> Result<MongoFind, SourceError> {
        let (filter, sort, skip) = match &request.cursor {
            Some(range) => (cursor_filter(&self.filter, range), cursor_sort(range), 0),
            None => (self.filter.clone(), doc! { "_id": 1 }, request.offset as u64),
        };

        let mut options = FindOptions::builder().sort(sort).skip(skip).build();
        options.limit = request.page_size.map(|size| size as i64);
        options.projection = self.projection();
        options.batch_size = self.config.batch_size;

        Ok(MongoFind { filter, options })
    }

    async fn execute(&mut self, fetch: MongoFind) -> Result<Vec<RowData>, SourceError> {
        let collection = self.collection.as_ref().ok_or(SourceError::NotConnected)?;
        debug!(filter = %fetch.filter, "Running find");

        let mut cursor = collection.find(fetch.filter).with_options(fetch.options).await?;
        let mut rows = Vec::new();
        while cursor.advance().await? {
            let document: Document = cursor.deserialize_current()?;
            rows.push(document_to_row(document, &self.config.collection));
        }
        Ok(rows)
    }

    async fn disconnect(&mut self) -> Result<(), SourceError> {
        self.collection = None;
        if let Some(client) = self.client.take() {
            client.shutdown().await;
        }
        Ok(())
    }
}
