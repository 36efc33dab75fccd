use serde::Serialize;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    pages: AtomicU64,
    rows: AtomicU64,
    documents: AtomicU64,
    decode_failures: AtomicU64,
    transform_skipped: AtomicU64,
    collect_failures: AtomicU64,
}

/// Counters of one scan. Clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct ScanMetrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanMetricsSnapshot {
    pub pages: u64,
    pub rows: u64,
    pub documents: u64,
    pub decode_failures: u64,
    pub transform_skipped: u64,
    pub collect_failures: u64,
}

impl ScanMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_pages(&self) {
        self.inner.pages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rows(&self, count: u64) {
        self.inner.rows.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_documents(&self) {
        self.inner.documents.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_decode_failures(&self, count: u64) {
        self.inner
            .decode_failures
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_transform_skipped(&self) {
        self.inner.transform_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_collect_failures(&self) {
        self.inner.collect_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ScanMetricsSnapshot {
        ScanMetricsSnapshot {
            pages: self.inner.pages.load(Ordering::Relaxed),
            rows: self.inner.rows.load(Ordering::Relaxed),
            documents: self.inner.documents.load(Ordering::Relaxed),
            decode_failures: self.inner.decode_failures.load(Ordering::Relaxed),
            transform_skipped: self.inner.transform_skipped.load(Ordering::Relaxed),
            collect_failures: self.inner.collect_failures.load(Ordering::Relaxed),
        }
    }
}
