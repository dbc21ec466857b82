use crate::{error::{TailError, WriteError}, exception_shield::shield};
use model::{
    contracts::{SchemaLoader, SourceDriver, SqlAdapter},
    oplog::{OpCode, OplogEntry},
    value,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Options the op interpreter reads directly (§6's options table).
#[derive(Debug, Clone, Copy, Default)]
pub struct InterpreterOptions {
    pub ignore_delete: bool,
    pub unsafe_mode: bool,
}

/// Classifies one oplog entry and maps it to a target action (C5, §4.5).
pub struct Interpreter {
    schema: Arc<dyn SchemaLoader>,
    adapter: Arc<dyn SqlAdapter>,
    source: Arc<dyn SourceDriver>,
    opts: InterpreterOptions,
}

impl Interpreter {
    pub fn new(
        schema: Arc<dyn SchemaLoader>,
        adapter: Arc<dyn SqlAdapter>,
        source: Arc<dyn SourceDriver>,
        opts: InterpreterOptions,
    ) -> Self {
        Interpreter { schema, adapter, source, opts }
    }

    pub async fn apply(&self, entry: &OplogEntry) -> Result<(), TailError> {
        let (Some(ns), Some(op)) = (&entry.ns, &entry.op) else {
            warn!("oplog entry missing ns or op, dropping");
            return Ok(());
        };

        if !self.schema.find_ns(ns) {
            debug!(ns = %ns, "namespace not configured, dropping");
            return Ok(());
        }

        match op {
            OpCode::Noop => {
                debug!("no-op oplog entry");
                Ok(())
            }
            OpCode::Insert => self.apply_insert(ns, entry).await,
            OpCode::Update => self.apply_update(ns, entry).await,
            OpCode::Delete => self.apply_delete(ns, entry).await,
            OpCode::Unknown(c) => {
                info!(op = %c, "unknown oplog opcode, skipping");
                Ok(())
            }
        }
    }

    async fn apply_insert(&self, ns: &model::namespace::Namespace, entry: &OplogEntry) -> Result<(), TailError> {
        if ns.is_system_indexes() {
            info!(ns = %ns, "skipping index-build insert");
            return Ok(());
        }

        let row = entry.o.clone();
        let columns = self.zipped_for_shield(ns, &entry.o);
        let adapter = self.adapter.clone();
        let ns_owned = ns.clone();
        shield(self.adapter.adapter_scheme(), self.opts.unsafe_mode, ns, &columns, move || async move {
            adapter.upsert_ns(&ns_owned, &row).await
        })
        .await?;
        Ok(())
    }

    async fn apply_update(&self, ns: &model::namespace::Namespace, entry: &OplogEntry) -> Result<(), TailError> {
        if entry.is_mutator_update() {
            self.apply_mutator_update(ns, entry).await
        } else {
            self.apply_replacement_update(ns, entry).await
        }
    }

    /// Mutator updates cannot be replayed against a row-oriented
    /// projection, so resync from the authoritative source (§4.5).
    async fn apply_mutator_update(&self, ns: &model::namespace::Namespace, entry: &OplogEntry) -> Result<(), TailError> {
        let Some(id_bson) = entry.selector_id() else {
            warn!(ns = %ns, "mutator update missing selector _id, dropping");
            return Ok(());
        };
        let id = value::from_bson(id_bson);

        match self.source.find_one(ns, &id).await? {
            Some(doc) => {
                let columns = self.zipped_for_shield(ns, &doc);
                let adapter = self.adapter.clone();
                let ns_owned = ns.clone();
                shield(self.adapter.adapter_scheme(), self.opts.unsafe_mode, ns, &columns, move || async move {
                    adapter.upsert_ns(&ns_owned, &doc).await
                })
                .await?;
            }
            None => {
                debug!(ns = %ns, "mutator target deleted at source, issuing delete");
                let pk_row = self
                    .adapter
                    .transform_one_ns(ns, &id)
                    .await
                    .map_err(|e| TailError::Write(WriteError::Sql(e)))?;
                let selector = entry.o2.clone().unwrap_or_default();
                let adapter = self.adapter.clone();
                let ns_owned = ns.clone();
                shield(self.adapter.adapter_scheme(), self.opts.unsafe_mode, ns, &pk_row, move || async move {
                    adapter.delete_ns(&ns_owned, &selector).await
                })
                .await?;
            }
        }
        Ok(())
    }

    /// The oplog's `o` is the full new image except `_id`; restore it from
    /// the update selector and upsert (§4.5).
    async fn apply_replacement_update(&self, ns: &model::namespace::Namespace, entry: &OplogEntry) -> Result<(), TailError> {
        let Some(id_bson) = entry.selector_id() else {
            warn!(ns = %ns, "replacement update missing selector _id, dropping");
            return Ok(());
        };

        let mut doc = entry.o.clone();
        doc.insert("_id", id_bson.clone());

        let columns = self.zipped_for_shield(ns, &doc);
        let adapter = self.adapter.clone();
        let ns_owned = ns.clone();
        shield(self.adapter.adapter_scheme(), self.opts.unsafe_mode, ns, &columns, move || async move {
            adapter.upsert_ns(&ns_owned, &doc).await
        })
        .await?;
        Ok(())
    }

    async fn apply_delete(&self, ns: &model::namespace::Namespace, entry: &OplogEntry) -> Result<(), TailError> {
        if self.opts.ignore_delete {
            debug!(ns = %ns, "ignore-delete set, dropping delete");
            return Ok(());
        }

        let selector = entry.o.clone();
        let columns = self.zipped_for_shield(ns, &entry.o);
        let adapter = self.adapter.clone();
        let ns_owned = ns.clone();
        shield(self.adapter.adapter_scheme(), self.opts.unsafe_mode, ns, &columns, move || async move {
            adapter.delete_ns(&ns_owned, &selector).await
        })
        .await?;
        Ok(())
    }

    /// Builds the column→value map the exception shield logs on failure;
    /// falls back to an empty map when the schema has no transform for
    /// this document shape (never blocks the write itself).
    fn zipped_for_shield(
        &self,
        ns: &model::namespace::Namespace,
        doc: &bson::Document,
    ) -> std::collections::BTreeMap<String, model::value::Value> {
        let Some(columns) = self.schema.all_columns(ns) else {
            return Default::default();
        };
        self.schema
            .transform(ns, doc)
            .map(|row| row.zip_columns(&columns))
            .unwrap_or_default()
    }
}
