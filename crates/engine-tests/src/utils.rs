#![allow(dead_code)]

use async_trait::async_trait;
use engine_core::{
    collect::Collector,
    cursor::{CursorSerializer, CursorWatermark, compare, compare::compare_values},
    error::{CollectError, CursorError, StateStoreError},
    scan::{PageRequest, SourceBackend, SourceSchema},
    state::{SyncStateStore, memory::MemoryStateStore},
};
use model::{
    pagination::cursor::{CursorKind, StoredCursor},
    records::{document::Document, row::RowData},
    state::SyncState,
};
use std::{
    cmp::Ordering,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering as AtomicOrdering},
    },
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("Stored watermark is unreadable: {0}")]
    Cursor(#[from] CursorError),

    #[error("Source unavailable")]
    Unavailable,
}

/// What a [`MemoryBackend`] was asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRecord {
    pub page: u64,
    pub page_size: Option<usize>,
    pub offset: usize,
    pub after: Option<StoredCursor>,
}

#[derive(Debug, Clone)]
pub struct MemoryFetch {
    record: FetchRecord,
    cursor: Option<(String, String, CursorKind)>,
}

/// Observable side of a backend, kept after the backend moves into a
/// scanner.
#[derive(Clone, Default)]
pub struct BackendProbe {
    pub fetches: Arc<Mutex<Vec<FetchRecord>>>,
    pub connects: Arc<AtomicUsize>,
    pub disconnects: Arc<AtomicUsize>,
}

impl BackendProbe {
    pub fn fetches(&self) -> Vec<FetchRecord> {
        self.fetches.lock().unwrap().clone()
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(AtomicOrdering::SeqCst)
    }
}

/// Serves rows from memory the way a relational source would answer the
/// generated statements: full fetches page by offset in insertion order;
/// incremental fetches return rows strictly after the watermark, ordered
/// by property then tie-breaker.
pub struct MemoryBackend {
    rows: Arc<Mutex<Vec<RowData>>>,
    schema: Option<Vec<String>>,
    fail_connect: bool,
    probe: BackendProbe,
}

impl MemoryBackend {
    pub fn new(rows: Vec<RowData>) -> Self {
        Self {
            rows: Arc::new(Mutex::new(rows)),
            schema: None,
            fail_connect: false,
            probe: BackendProbe::default(),
        }
    }

    pub fn with_schema(mut self, fields: &[&str]) -> Self {
        self.schema = Some(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    /// Handle for appending rows between scans.
    pub fn rows(&self) -> Arc<Mutex<Vec<RowData>>> {
        self.rows.clone()
    }

    pub fn probe(&self) -> BackendProbe {
        self.probe.clone()
    }

    fn after(
        rows: Vec<RowData>,
        property: &str,
        tie: &str,
        kind: CursorKind,
        after: Option<&CursorWatermark>,
    ) -> Vec<RowData> {
        let serializer = CursorSerializer::new(kind);
        let mut keyed = Vec::new();
        let mut unreadable = Vec::new();
        for row in rows {
            match serializer.from_row(&row, property, Some(tie)) {
                Ok(wm) => keyed.push((wm, row)),
                // NULL never satisfies `p > ?`; the opening fetch has no predicate.
                Err(_) if after.is_none() => unreadable.push(row),
                Err(_) => {}
            }
        }

        keyed.retain(|(wm, _)| match after {
            None => true,
            // A resume point has no tie and matches on the property alone.
            Some(after) if after.tie().is_none() => {
                compare_values(wm.property(), after.property(), kind) == Ordering::Greater
            }
            Some(after) => compare(Some(wm), Some(after), Some(kind)) == Ordering::Greater,
        });
        keyed.sort_by(|a, b| compare(Some(&a.0), Some(&b.0), Some(kind)));
        keyed.into_iter().map(|(_, row)| row).chain(unreadable).collect()
    }
}

#[async_trait]
impl SourceBackend for MemoryBackend {
    type Fetch = MemoryFetch;
    type Error = MemoryError;

    fn name(&self) -> &str {
        "memory"
    }

    async fn connect(&mut self) -> Result<(), MemoryError> {
        self.probe.connects.fetch_add(1, AtomicOrdering::SeqCst);
        if self.fail_connect {
            return Err(MemoryError::Unavailable);
        }
        Ok(())
    }

    async fn describe_schema(&mut self) -> Result<Option<SourceSchema>, MemoryError> {
        Ok(self
            .schema
            .clone()
            .map(|fields| SourceSchema::new("query", fields)))
    }

    fn build_fetch(&self, request: &PageRequest<'_>) -> Result<MemoryFetch, MemoryError> {
        Ok(MemoryFetch {
            record: FetchRecord {
                page: request.page,
                page_size: request.page_size,
                offset: request.offset,
                after: request
                    .cursor
                    .and_then(|c| c.after)
                    .map(|wm| wm.stored().clone()),
            },
            cursor: request.cursor.map(|c| {
                (
                    c.property.to_string(),
                    c.tie_breaker.to_string(),
                    c.property_kind,
                )
            }),
        })
    }

    async fn execute(&mut self, fetch: MemoryFetch) -> Result<Vec<RowData>, MemoryError> {
        self.probe.fetches.lock().unwrap().push(fetch.record.clone());
        let rows = self.rows.lock().unwrap().clone();

        let ordered = match &fetch.cursor {
            None => rows,
            Some((property, tie, kind)) => {
                let after = fetch
                    .record
                    .after
                    .clone()
                    .map(|stored| CursorSerializer::new(*kind).from_stored(stored))
                    .transpose()?;
                Self::after(rows, property, tie, *kind, after.as_ref())
            }
        };

        let limit = fetch.record.page_size.unwrap_or(usize::MAX);
        Ok(ordered
            .into_iter()
            .skip(fetch.record.offset)
            .take(limit)
            .collect())
    }

    async fn disconnect(&mut self) -> Result<(), MemoryError> {
        self.probe.disconnects.fetch_add(1, AtomicOrdering::SeqCst);
        Ok(())
    }
}

/// Ignores the watermark and serves the same rows forever, like a source
/// whose tie-breaker is not unique.
pub struct StuckBackend {
    rows: Vec<RowData>,
    probe: BackendProbe,
}

impl StuckBackend {
    pub fn new(rows: Vec<RowData>) -> Self {
        Self {
            rows,
            probe: BackendProbe::default(),
        }
    }

    pub fn probe(&self) -> BackendProbe {
        self.probe.clone()
    }
}

#[async_trait]
impl SourceBackend for StuckBackend {
    type Fetch = u64;
    type Error = MemoryError;

    fn name(&self) -> &str {
        "stuck"
    }

    async fn connect(&mut self) -> Result<(), MemoryError> {
        Ok(())
    }

    async fn describe_schema(&mut self) -> Result<Option<SourceSchema>, MemoryError> {
        Ok(None)
    }

    fn build_fetch(&self, request: &PageRequest<'_>) -> Result<u64, MemoryError> {
        Ok(request.page)
    }

    async fn execute(&mut self, page: u64) -> Result<Vec<RowData>, MemoryError> {
        self.probe.fetches.lock().unwrap().push(FetchRecord {
            page,
            page_size: None,
            offset: 0,
            after: None,
        });
        Ok(self.rows.clone())
    }

    async fn disconnect(&mut self) -> Result<(), MemoryError> {
        self.probe.disconnects.fetch_add(1, AtomicOrdering::SeqCst);
        Ok(())
    }
}

/// Memory store that counts writes.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStateStore,
    saves: AtomicUsize,
}

impl CountingStore {
    pub fn saves(&self) -> usize {
        self.saves.load(AtomicOrdering::SeqCst)
    }
}

#[async_trait]
impl SyncStateStore for CountingStore {
    async fn load(
        &self,
        connector_id: &str,
        datasource_id: &str,
    ) -> Result<Option<SyncState>, StateStoreError> {
        self.inner.load(connector_id, datasource_id).await
    }

    async fn save(&self, state: &SyncState) -> Result<(), StateStoreError> {
        self.saves.fetch_add(1, AtomicOrdering::SeqCst);
        self.inner.save(state).await
    }

    async fn clear(&self, connector_id: &str, datasource_id: &str) -> Result<(), StateStoreError> {
        self.inner.clear(connector_id, datasource_id).await
    }

    async fn list(&self) -> Result<Vec<SyncState>, StateStoreError> {
        self.inner.list().await
    }
}

/// What a [`MemoryCollector`] does with a document.
#[derive(Debug, Clone, Default)]
pub enum CollectBehavior {
    #[default]
    Accept,
    /// Refuses documents whose payload `id` is listed.
    Reject(Vec<String>),
    /// Reports a hard stop once this many documents were accepted.
    StopAfter(usize),
    /// Cancels the token once this many documents were accepted.
    CancelAfter(usize, CancellationToken),
}

#[derive(Default)]
pub struct MemoryCollector {
    documents: Mutex<Vec<Document>>,
    behavior: CollectBehavior,
}

impl MemoryCollector {
    pub fn new(behavior: CollectBehavior) -> Self {
        Self {
            documents: Mutex::new(Vec::new()),
            behavior,
        }
    }

    pub fn documents(&self) -> Vec<Document> {
        self.documents.lock().unwrap().clone()
    }

    /// Payload `id` of every collected document, in order.
    pub fn ids(&self) -> Vec<String> {
        self.documents()
            .iter()
            .filter_map(|d| d.payload.get("id").and_then(|v| v.as_str()).map(String::from))
            .collect()
    }
}

#[async_trait]
impl Collector for MemoryCollector {
    async fn collect(&self, document: Document) -> Result<(), CollectError> {
        let mut documents = self.documents.lock().unwrap();
        match &self.behavior {
            CollectBehavior::Accept => {}
            CollectBehavior::Reject(ids) => {
                let id = document.payload.get("id").and_then(|v| v.as_str()).unwrap_or_default();
                if ids.iter().any(|r| r == id) {
                    return Err(CollectError::Rejected(format!("document {id} refused")));
                }
            }
            CollectBehavior::StopAfter(limit) => {
                if documents.len() >= *limit {
                    return Err(CollectError::Stopped("datasource deleted".to_string()));
                }
            }
            CollectBehavior::CancelAfter(limit, token) => {
                if documents.len() + 1 >= *limit {
                    token.cancel();
                }
            }
        }
        documents.push(document);
        Ok(())
    }
}
