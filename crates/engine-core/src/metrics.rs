use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Import-run counters: rows scanned, batches flushed, and cumulative
/// wall-clock time spent inside the bulk writer — the numbers §4.4 step 3
/// asks the importer to log at every batch boundary.
#[derive(Debug, Default, Clone)]
pub struct ImportMetrics {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    rows: AtomicU64,
    batches: AtomicU64,
    sql_micros: AtomicU64,
}

impl ImportMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rows(&self, count: u64) {
        self.inner.rows.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_batch(&self, sql_time: Duration) {
        self.inner.batches.fetch_add(1, Ordering::Relaxed);
        self.inner
            .sql_micros
            .fetch_add(sql_time.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ImportMetricsSnapshot {
        ImportMetricsSnapshot {
            rows: self.inner.rows.load(Ordering::Relaxed),
            batches: self.inner.batches.load(Ordering::Relaxed),
            sql_time: Duration::from_micros(self.inner.sql_micros.load(Ordering::Relaxed)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ImportMetricsSnapshot {
    pub rows: u64,
    pub batches: u64,
    pub sql_time: Duration,
}
