use crate::{bulk_writer::BulkWriter, error::{ImportError, WriteError}, retry::classify_source_error};
use engine_core::{RetryPolicy, StopFlag, TruncationMemo};
use model::{
    batch::{Batch, MAX_BATCH_SIZE},
    contracts::{SchemaLoader, SourceDriver, SqlAdapter, Tailer},
    namespace::Namespace,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Options the importer reads directly (§6's options table, the subset
/// that bears on C4).
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub no_drop_tables: bool,
    pub skip_tail: bool,
}

/// For each configured namespace: truncate, scan, transform, batch, write
/// (C4, §4.4).
pub struct Importer {
    source: Arc<dyn SourceDriver>,
    schema: Arc<dyn SchemaLoader>,
    adapter: Arc<dyn SqlAdapter>,
    tailer: Arc<Mutex<dyn Tailer>>,
    writer: BulkWriter,
    truncation: TruncationMemo,
    stop: StopFlag,
    retry: RetryPolicy,
}

impl Importer {
    pub fn new(
        source: Arc<dyn SourceDriver>,
        schema: Arc<dyn SchemaLoader>,
        adapter: Arc<dyn SqlAdapter>,
        tailer: Arc<Mutex<dyn Tailer>>,
        writer: BulkWriter,
        stop: StopFlag,
    ) -> Self {
        Importer {
            source,
            schema,
            adapter,
            tailer,
            writer,
            truncation: TruncationMemo::new(),
            stop,
            retry: RetryPolicy::reference(),
        }
    }

    pub async fn run(&self, opts: &ImportOptions) -> Result<(), ImportError> {
        for db in self.schema.configured_databases() {
            self.schema
                .create_schema(&db, !opts.no_drop_tables)
                .await
                .map_err(|e| ImportError::Write(WriteError::Sql(e)))?;
        }

        let start_ts = if opts.skip_tail {
            None
        } else {
            Some(self.source.oplog_start_ts().await?)
        };

        for db in self.schema.configured_databases() {
            for collection in self.schema.configured_collections(&db) {
                if self.stop.is_tripped() {
                    info!("stop flag set, aborting import");
                    return Ok(());
                }
                let ns = Namespace::parse(&format!("{db}.{collection}"))
                    .expect("schema-configured namespace must be well-formed");
                self.import_namespace(&db, &ns, opts).await?;
            }
        }

        if let (false, Some(ts)) = (opts.skip_tail, start_ts) {
            self.tailer.lock().await.write_timestamp(ts).await?;
        }

        Ok(())
    }

    async fn import_namespace(
        &self,
        db: &str,
        ns: &Namespace,
        opts: &ImportOptions,
    ) -> Result<(), ImportError> {
        let table = self
            .schema
            .table_for_ns(ns)
            .unwrap_or_else(|| ns.as_str().to_string());

        if !opts.no_drop_tables && self.truncation.mark_if_first(&table) {
            let handle = self
                .adapter
                .table_for_ns(ns)
                .await
                .map_err(|e| ImportError::Write(WriteError::Sql(e)))?;
            handle
                .truncate()
                .await
                .map_err(|e| ImportError::Write(WriteError::Sql(e)))?;
        }

        let mut cursor = self
            .retry
            .run(
                || self.source.scan(db, ns.collection(), MAX_BATCH_SIZE),
                classify_source_error,
            )
            .await
            .map_err(|e| ImportError::Source(into_source_error(e)))?;

        let mut batch = Batch::new();
        let mut rows_seen = 0u64;
        let scan_start = Instant::now();

        loop {
            let next = self
                .retry
                .run(|| cursor.next(), classify_source_error)
                .await
                .map_err(|e| ImportError::Source(into_source_error(e)))?;

            let Some(doc) = next else { break };

            if let Some(row) = self.schema.transform(ns, &doc) {
                batch.push(row);
            }

            if batch.is_full() {
                rows_seen += batch.len() as u64;
                self.writer.write_batch(db, ns, &mut batch).await?;
                debug!(ns = %ns, rows = rows_seen, elapsed_ms = scan_start.elapsed().as_millis(), "import progress");
                if self.stop.is_tripped() {
                    info!(ns = %ns, "stop flag set mid-scan, aborting import");
                    return Ok(());
                }
            }
        }

        if !batch.is_empty() {
            rows_seen += batch.len() as u64;
            self.writer.write_batch(db, ns, &mut batch).await?;
        }

        info!(ns = %ns, rows = rows_seen, "namespace import complete");
        Ok(())
    }

}

fn into_source_error(err: engine_core::RetryError<model::contracts::SourceError>) -> model::contracts::SourceError {
    match err {
        engine_core::RetryError::Fatal(e) | engine_core::RetryError::AttemptsExceeded(e) => e,
    }
}
