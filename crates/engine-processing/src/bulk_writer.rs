use crate::{error::WriteError, exception_shield::shield};
use engine_core::ImportMetrics;
use model::{
    batch::Batch,
    contracts::{SchemaLoader, SqlAdapter},
    namespace::Namespace,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

/// Turns one batch of transformed rows into a single bulk write, falling
/// back to per-row upserts under the exception shield when the bulk path
/// fails (C2, §4.2).
pub struct BulkWriter {
    schema: Arc<dyn SchemaLoader>,
    adapter: Arc<dyn SqlAdapter>,
    unsafe_mode: bool,
    metrics: ImportMetrics,
}

impl BulkWriter {
    pub fn new(
        schema: Arc<dyn SchemaLoader>,
        adapter: Arc<dyn SqlAdapter>,
        unsafe_mode: bool,
        metrics: ImportMetrics,
    ) -> Self {
        BulkWriter { schema, adapter, unsafe_mode, metrics }
    }

    pub async fn write_batch(&self, db: &str, ns: &Namespace, batch: &mut Batch) -> Result<(), WriteError> {
        let start = Instant::now();
        let rows = batch.take();

        if let Err(err) = self.schema.copy_data(db, ns, &rows).await {
            warn!(ns = %ns, error = %err, "bulk copy failed, falling back to per-row upserts");
            self.write_rows_one_by_one(ns, &rows).await?;
        }

        self.metrics.add_rows(rows.len() as u64);
        self.metrics.add_batch(start.elapsed());
        Ok(())
    }

    async fn write_rows_one_by_one(
        &self,
        ns: &Namespace,
        rows: &[model::row::RowTuple],
    ) -> Result<(), WriteError> {
        let columns = self
            .schema
            .all_columns(ns)
            .ok_or_else(|| WriteError::Sql(model::contracts::SqlError::Other(format!("no columns configured for {ns}"))))?;
        let primary_key = self
            .schema
            .primary_sql_key_for_ns(ns)
            .ok_or_else(|| WriteError::Sql(model::contracts::SqlError::Other(format!("no primary key configured for {ns}"))))?;
        let table = self.adapter.table_for_ns(ns).await?;
        let scheme = self.adapter.adapter_scheme();

        for row in rows {
            let zipped = row.zip_columns(&columns);
            let write_copy = zipped.clone();
            let adapter = self.adapter.clone();
            let table = table.clone();
            let primary_key = primary_key.clone();
            shield(scheme, self.unsafe_mode, ns, &zipped, move || async move {
                adapter.upsert(table.as_ref(), &primary_key, &write_copy).await
            })
            .await?;
        }
        Ok(())
    }
}
