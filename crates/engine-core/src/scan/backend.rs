use crate::cursor::CursorWatermark;
use async_trait::async_trait;
use model::{pagination::cursor::CursorKind, records::row::RowData};

/// Fields a source returns for its configured query or collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceSchema {
    pub entity: String,
    pub fields: Vec<String>,
}

impl SourceSchema {
    pub fn new(entity: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            entity: entity.into(),
            fields,
        }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.eq_ignore_ascii_case(field))
    }
}

/// Ordering and lower bound of an incremental fetch.
#[derive(Debug, Clone, Copy)]
pub struct CursorRange<'a> {
    pub property: &'a str,
    pub tie_breaker: &'a str,
    pub property_kind: CursorKind,
    /// Only rows strictly after this watermark are wanted; `None` reads
    /// from the beginning.
    pub after: Option<&'a CursorWatermark>,
}

/// What the scan loop asks a backend to fetch next.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest<'a> {
    pub page: u64,
    /// `None` reads everything in one fetch.
    pub page_size: Option<usize>,
    /// Rows to skip; always zero for incremental fetches.
    pub offset: usize,
    pub cursor: Option<CursorRange<'a>>,
}

/// One kind of source. Building a fetch is pure; everything that touches
/// the source is async and owned by the backend.
#[async_trait]
pub trait SourceBackend: Send {
    type Fetch: Send;
    type Error: std::error::Error + Send + Sync + 'static;

    fn name(&self) -> &str;

    async fn connect(&mut self) -> Result<(), Self::Error>;

    /// Fields the configured fetch returns, when the source can tell
    /// without reading rows.
    async fn describe_schema(&mut self) -> Result<Option<SourceSchema>, Self::Error>;

    fn build_fetch(&self, request: &PageRequest<'_>) -> Result<Self::Fetch, Self::Error>;

    async fn execute(&mut self, fetch: Self::Fetch) -> Result<Vec<RowData>, Self::Error>;

    async fn disconnect(&mut self) -> Result<(), Self::Error>;
}
