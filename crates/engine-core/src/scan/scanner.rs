use crate::{
    collect::Collector,
    cursor::{CursorSerializer, CursorWatermark, compare},
    error::{CollectError, CursorError, ScanError},
    metrics::ScanMetrics,
    scan::{
        backend::{CursorRange, PageRequest, SourceBackend, SourceSchema},
        outcome::{ScanOutcome, ScanStatus},
    },
    state::{SyncStateStore, manager::CursorStateManager},
    transform::Transformer,
};
use engine_config::{
    datasource::{DatasourceConfig, PaginationConfig, ScanPolicy},
    incremental::IncrementalConfig,
};
use model::records::{document::DataSourceRef, row::RowData};
use std::{cmp::Ordering, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Shared collaborators of a scan.
#[derive(Clone)]
pub struct ScanContext {
    pub store: Arc<dyn SyncStateStore>,
    pub collector: Arc<dyn Collector>,
    pub cancel: CancellationToken,
}

struct Incremental {
    config: IncrementalConfig,
    serializer: CursorSerializer,
    state: CursorStateManager,
}

enum PageResult {
    Done(Option<CursorWatermark>),
    Cancelled,
}

/// Runs one scan of one datasource against a backend.
pub struct Scanner<B: SourceBackend> {
    backend: B,
    connector_id: String,
    datasource: DataSourceRef,
    pagination: PaginationConfig,
    policy: ScanPolicy,
    primary_key: Option<String>,
    incremental: Option<Incremental>,
    transformer: Transformer,
    collector: Arc<dyn Collector>,
    cancel: CancellationToken,
    metrics: ScanMetrics,
}

impl<B: SourceBackend> Scanner<B> {
    /// Validates `config`; configuration faults surface here, before the
    /// source is touched.
    pub fn new(backend: B, mut config: DatasourceConfig, ctx: ScanContext) -> Result<Self, ScanError> {
        config.validate()?;

        let incremental = config.incremental().cloned().map(|cfg| {
            let serializer = CursorSerializer::new(cfg.property_type);
            Incremental {
                state: CursorStateManager::new(
                    ctx.store.clone(),
                    config.connector_id.clone(),
                    config.id.clone(),
                    serializer,
                ),
                serializer,
                config: cfg,
            }
        });
        let datasource = DataSourceRef::connector(config.id.clone(), config.name.clone());

        Ok(Self {
            backend,
            primary_key: config.field_mapping.primary_key().map(str::to_string),
            transformer: Transformer::new(datasource.clone(), config.field_mapping),
            connector_id: config.connector_id,
            datasource,
            pagination: config.pagination,
            policy: config.policy,
            incremental,
            collector: ctx.collector,
            cancel: ctx.cancel,
            metrics: ScanMetrics::new(),
        })
    }

    pub async fn run(mut self) -> Result<ScanOutcome, ScanError> {
        if self.cancel.is_cancelled() {
            return Ok(self.outcome(ScanStatus::Cancelled, None));
        }

        info!(
            connector = %self.connector_id,
            datasource = %self.datasource.id,
            backend = %self.backend.name(),
            incremental = self.incremental.is_some(),
            "Starting scan"
        );

        if let Err(err) = self.backend.connect().await {
            let err = ScanError::source(err);
            self.log_failure(&err);
            return Err(err);
        }

        let result = self.scan().await;

        if let Err(err) = self.backend.disconnect().await {
            warn!(
                connector = %self.connector_id,
                datasource = %self.datasource.id,
                error = %err,
                "Failed to release source connection"
            );
        }

        match &result {
            Ok(outcome) => info!(
                connector = %self.connector_id,
                datasource = %self.datasource.id,
                status = ?outcome.status,
                pages = outcome.metrics.pages,
                rows = outcome.metrics.rows,
                documents = outcome.metrics.documents,
                "Scan finished"
            ),
            Err(err) => self.log_failure(err),
        }
        result
    }

    async fn scan(&mut self) -> Result<ScanOutcome, ScanError> {
        if let Some(schema) = self
            .backend
            .describe_schema()
            .await
            .map_err(ScanError::source)?
        {
            self.validate_schema(&schema)?;
        }

        match self.incremental.take() {
            Some(incremental) => {
                let result = self.scan_incremental(&incremental).await;
                self.incremental = Some(incremental);
                result
            }
            None => self.scan_full().await,
        }
    }

    fn validate_schema(&self, schema: &SourceSchema) -> Result<(), ScanError> {
        let mut required: Vec<&str> = Vec::new();
        if let Some(pk) = &self.primary_key {
            required.push(pk);
        }
        if let Some(inc) = &self.incremental {
            required.push(&inc.config.property);
            required.push(&inc.config.tie_breaker);
        }

        for field in required {
            if !schema.contains(field) {
                return Err(ScanError::MissingField {
                    entity: schema.entity.clone(),
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Offset paging over the unfiltered source. Nothing is persisted.
    async fn scan_full(&mut self) -> Result<ScanOutcome, ScanError> {
        let page_size = self.pagination.page_size();
        let mut offset = 0;
        let mut page = 0;

        loop {
            if self.cancel.is_cancelled() {
                return Ok(self.outcome(ScanStatus::Cancelled, None));
            }
            page += 1;

            let request = PageRequest {
                page,
                page_size,
                offset,
                cursor: None,
            };
            let rows = self.fetch(&request).await?;
            if rows.is_empty() {
                break;
            }

            let count = rows.len();
            if let PageResult::Cancelled = self.process_page(page, &rows, None).await? {
                return Ok(self.outcome(ScanStatus::Cancelled, None));
            }
            offset += count;

            match page_size {
                Some(size) if count >= size => continue,
                _ => break,
            }
        }

        Ok(self.outcome(ScanStatus::Completed, None))
    }

    /// Every fetch starts strictly after the current watermark, which
    /// advances and is persisted after each page.
    async fn scan_incremental(&mut self, inc: &Incremental) -> Result<ScanOutcome, ScanError> {
        let cfg = &inc.config;
        let mut watermark = inc.state.load_with_fallback(cfg).await?;
        let mut persisted = None;
        let mut page = 0;

        loop {
            if self.cancel.is_cancelled() {
                return Ok(self.outcome(ScanStatus::Cancelled, persisted));
            }
            page += 1;

            let request = PageRequest {
                page,
                page_size: self.pagination.page_size(),
                offset: 0,
                cursor: Some(CursorRange {
                    property: &cfg.property,
                    tie_breaker: &cfg.tie_breaker,
                    property_kind: cfg.property_type,
                    after: watermark.as_ref(),
                }),
            };
            let rows = self.fetch(&request).await?;
            if rows.is_empty() {
                break;
            }

            let candidate = match self.process_page(page, &rows, Some(inc)).await? {
                PageResult::Cancelled => {
                    return Ok(self.outcome(ScanStatus::Cancelled, persisted));
                }
                PageResult::Done(candidate) => candidate,
            };
            let Some(candidate) = candidate else {
                // process_page rejects pages without any candidate.
                break;
            };

            let ordering = compare(Some(&candidate), watermark.as_ref(), Some(cfg.property_type));
            if ordering != Ordering::Greater {
                return Err(ScanError::Stagnation {
                    page,
                    previous: watermark
                        .as_ref()
                        .map(|w| w.stored().to_string())
                        .unwrap_or_default(),
                    candidate: candidate.stored().to_string(),
                    regressed: ordering == Ordering::Less,
                });
            }

            inc.state.save(&cfg.property, Some(&candidate)).await?;
            info!(
                connector = %self.connector_id,
                datasource = %self.datasource.id,
                page,
                rows = rows.len(),
                watermark = %candidate.stored(),
                "Watermark advanced"
            );
            persisted = Some(candidate.stored().clone());
            watermark = Some(candidate);
        }

        Ok(self.outcome(ScanStatus::Completed, persisted))
    }

    async fn fetch(&mut self, request: &PageRequest<'_>) -> Result<Vec<RowData>, ScanError> {
        let fetch = self
            .backend
            .build_fetch(request)
            .map_err(ScanError::source)?;
        let rows = self
            .backend
            .execute(fetch)
            .await
            .map_err(ScanError::source)?;

        debug!(
            connector = %self.connector_id,
            datasource = %self.datasource.id,
            page = request.page,
            offset = request.offset,
            rows = rows.len(),
            "Fetched page"
        );
        if !rows.is_empty() {
            self.metrics.increment_pages();
            self.metrics.increment_rows(rows.len() as u64);
        }
        Ok(rows)
    }

    /// Transforms and collects every row and, when incremental, tracks the
    /// highest watermark of the page.
    async fn process_page(
        &mut self,
        page: u64,
        rows: &[RowData],
        incremental: Option<&Incremental>,
    ) -> Result<PageResult, ScanError> {
        let mut candidate: Option<CursorWatermark> = None;
        let mut decode_failures = 0usize;
        let mut last_decode_error: Option<CursorError> = None;
        let mut skipped = 0usize;

        for row in rows {
            if self.cancel.is_cancelled() {
                return Ok(PageResult::Cancelled);
            }

            if let Some(inc) = incremental {
                match inc.serializer.from_row(
                    row,
                    &inc.config.property,
                    Some(&inc.config.tie_breaker),
                ) {
                    Ok(wm) => {
                        let greater = compare(Some(&wm), candidate.as_ref(), Some(inc.config.property_type))
                            == Ordering::Greater;
                        if greater {
                            candidate = Some(wm);
                        }
                    }
                    Err(err) => {
                        warn!(
                            connector = %self.connector_id,
                            datasource = %self.datasource.id,
                            page,
                            error = %err,
                            "Row yields no watermark"
                        );
                        decode_failures += 1;
                        last_decode_error = Some(err);
                    }
                }
            }

            match self.transformer.transform(row) {
                Ok(doc) => match self.collector.collect(doc).await {
                    Ok(()) => self.metrics.increment_documents(),
                    Err(err @ CollectError::Stopped(_)) => return Err(ScanError::Collector(err)),
                    Err(err) => {
                        warn!(
                            connector = %self.connector_id,
                            datasource = %self.datasource.id,
                            error = %err,
                            "Failed to collect document"
                        );
                        self.metrics.increment_collect_failures();
                    }
                },
                Err(err) => {
                    warn!(
                        connector = %self.connector_id,
                        datasource = %self.datasource.id,
                        page,
                        error = %err,
                        "Skipping row that cannot be transformed"
                    );
                    skipped += 1;
                    self.metrics.increment_transform_skipped();
                }
            }
        }

        self.metrics
            .increment_decode_failures(decode_failures as u64);

        let total = rows.len();
        if skipped as f64 / total as f64 > self.policy.transform_failure_threshold {
            return Err(ScanError::TransformThreshold {
                page,
                rows: total,
                skipped,
            });
        }

        if incremental.is_some() {
            let ratio = decode_failures as f64 / total as f64;
            if candidate.is_none() || ratio >= self.policy.decode_failure_threshold {
                return Err(ScanError::Decode {
                    page,
                    rows: total,
                    failures: decode_failures,
                    last: last_decode_error.unwrap_or(CursorError::Null),
                });
            }
        }

        Ok(PageResult::Done(candidate))
    }

    fn outcome(
        &self,
        status: ScanStatus,
        watermark: Option<model::pagination::cursor::StoredCursor>,
    ) -> ScanOutcome {
        if status == ScanStatus::Cancelled {
            info!(
                connector = %self.connector_id,
                datasource = %self.datasource.id,
                "Scan cancelled"
            );
        }
        ScanOutcome {
            connector_id: self.connector_id.clone(),
            datasource_id: self.datasource.id.clone(),
            status,
            metrics: self.metrics.snapshot(),
            watermark,
        }
    }

    fn log_failure(&self, err: &ScanError) {
        error!(
            connector = %self.connector_id,
            datasource = %self.datasource.id,
            kind = err.kind(),
            error = %err,
            "Scan failed"
        );
    }
}
