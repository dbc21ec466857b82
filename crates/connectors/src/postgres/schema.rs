use crate::postgres::{adapter::PgAdapter, table::PgTableHandle};
use async_trait::async_trait;
use bson::{Bson, Document};
use model::{
    contracts::{SchemaLoader, SqlAdapter, SqlError, TableHandle},
    namespace::Namespace,
    row::RowTuple,
    value::{self, Value},
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One target column: `source` is the (possibly dotted) path into the
/// source document, defaulting to the column name itself when omitted.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(default)]
    pub source: Option<String>,
}

impl ColumnSpec {
    fn source_path(&self) -> &str {
        self.source.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamespaceConfig {
    pub table: String,
    pub primary_key: String,
    pub columns: Vec<ColumnSpec>,
}

/// The schema spec (§3): which source namespaces are mirrored, and how
/// each document field maps onto a target column.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SchemaConfig {
    pub databases: BTreeMap<String, BTreeMap<String, NamespaceConfig>>,
}

impl SchemaConfig {
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    fn ns_config(&self, ns: &Namespace) -> Option<&NamespaceConfig> {
        self.databases.get(ns.database())?.get(ns.collection())
    }
}

/// Looks up a dotted field path (`"address.city"`) inside a BSON document.
fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut parts = path.split('.');
    let first = parts.next()?;
    let mut current = doc.get(first)?;
    for part in parts {
        current = current.as_document()?.get(part)?;
    }
    Some(current)
}

/// Implements both halves of §6's target-side contract over one live
/// Postgres connection and a YAML-loaded schema spec.
pub struct PostgresTarget {
    adapter: PgAdapter,
    schema: SchemaConfig,
}

impl PostgresTarget {
    pub fn new(adapter: PgAdapter, schema: SchemaConfig) -> Self {
        PostgresTarget { adapter, schema }
    }
}

#[async_trait]
impl SchemaLoader for PostgresTarget {
    fn configured_databases(&self) -> Vec<String> {
        self.schema.databases.keys().cloned().collect()
    }

    fn configured_collections(&self, db: &str) -> Vec<String> {
        self.schema
            .databases
            .get(db)
            .map(|colls| colls.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn find_ns(&self, ns: &Namespace) -> bool {
        self.schema.ns_config(ns).is_some()
    }

    fn all_columns(&self, ns: &Namespace) -> Option<Vec<String>> {
        self.schema
            .ns_config(ns)
            .map(|cfg| cfg.columns.iter().map(|c| c.name.clone()).collect())
    }

    fn primary_sql_key_for_ns(&self, ns: &Namespace) -> Option<String> {
        self.schema.ns_config(ns).map(|cfg| cfg.primary_key.clone())
    }

    fn transform(&self, ns: &Namespace, doc: &Document) -> Option<RowTuple> {
        let cfg = self.schema.ns_config(ns)?;
        let values = cfg
            .columns
            .iter()
            .map(|col| {
                get_path(doc, col.source_path())
                    .map(value::from_bson)
                    .unwrap_or(Value::Null)
            })
            .collect();
        Some(RowTuple::new(values))
    }

    fn table_for_ns(&self, ns: &Namespace) -> Option<String> {
        self.schema.ns_config(ns).map(|cfg| cfg.table.clone())
    }

    async fn create_schema(&self, db: &str, drop_first: bool) -> Result<(), SqlError> {
        let Some(collections) = self.schema.databases.get(db) else {
            return Ok(());
        };

        for cfg in collections.values() {
            if drop_first {
                self.adapter
                    .exec(&format!("DROP TABLE IF EXISTS {}", cfg.table))
                    .await?;
            }

            let column_defs = cfg
                .columns
                .iter()
                .map(|c| format!("{} TEXT", c.name))
                .collect::<Vec<_>>()
                .join(", ");

            self.adapter
                .exec(&format!(
                    "CREATE TABLE IF NOT EXISTS {} ({}, PRIMARY KEY ({}))",
                    cfg.table, column_defs, cfg.primary_key
                ))
                .await?;
        }
        Ok(())
    }

    async fn copy_data(&self, _db: &str, ns: &Namespace, rows: &[RowTuple]) -> Result<(), SqlError> {
        let cfg = self
            .schema
            .ns_config(ns)
            .ok_or_else(|| SqlError::Other(format!("no schema mapping for {ns}")))?;

        let columns: Vec<String> = cfg.columns.iter().map(|c| c.name.clone()).collect();
        let rows: Vec<Vec<Value>> = rows.iter().map(|r| r.0.clone()).collect();

        self.adapter.copy_rows(&cfg.table, &columns, &rows).await?;
        Ok(())
    }
}

#[async_trait]
impl SqlAdapter for PostgresTarget {
    fn adapter_scheme(&self) -> model::contracts::AdapterKind {
        model::contracts::AdapterKind::Postgres
    }

    async fn table_for_ns(&self, ns: &Namespace) -> Result<Arc<dyn TableHandle>, SqlError> {
        let cfg = self
            .schema
            .ns_config(ns)
            .ok_or_else(|| SqlError::Other(format!("no schema mapping for {ns}")))?;
        Ok(Arc::new(PgTableHandle::new(cfg.table.clone(), self.adapter.clone())))
    }

    async fn upsert(
        &self,
        table: &dyn TableHandle,
        primary_key_column: &str,
        row: &BTreeMap<String, Value>,
    ) -> Result<(), SqlError> {
        let columns: Vec<&String> = row.keys().collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${i}")).collect();
        let update_clause = columns
            .iter()
            .filter(|c| c.as_str() != primary_key_column)
            .map(|c| format!("{c} = EXCLUDED.{c}"))
            .collect::<Vec<_>>()
            .join(", ");

        let column_list = columns
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let sql = if update_clause.is_empty() {
            format!(
                "INSERT INTO {} ({column_list}) VALUES ({}) ON CONFLICT ({primary_key_column}) DO NOTHING",
                table.name(),
                placeholders.join(", "),
            )
        } else {
            format!(
                "INSERT INTO {} ({column_list}) VALUES ({}) ON CONFLICT ({primary_key_column}) DO UPDATE SET {update_clause}",
                table.name(),
                placeholders.join(", "),
            )
        };

        let values: Vec<Value> = columns.iter().map(|c| row[*c].clone()).collect();
        self.adapter.exec_params(&sql, &values).await?;
        Ok(())
    }

    async fn upsert_ns(&self, ns: &Namespace, doc: &Document) -> Result<(), SqlError> {
        let cfg = self
            .schema
            .ns_config(ns)
            .ok_or_else(|| SqlError::Other(format!("no schema mapping for {ns}")))?;
        let table = SqlAdapter::table_for_ns(self, ns).await?;
        let row_tuple = SchemaLoader::transform(self, ns, doc)
            .ok_or_else(|| SqlError::Other(format!("transform produced no row for {ns}")))?;
        let columns: Vec<String> = cfg.columns.iter().map(|c| c.name.clone()).collect();
        let zipped = row_tuple.zip_columns(&columns);
        self.upsert(table.as_ref(), &cfg.primary_key, &zipped).await
    }

    async fn transform_one_ns(
        &self,
        ns: &Namespace,
        id: &Value,
    ) -> Result<BTreeMap<String, Value>, SqlError> {
        let cfg = self
            .schema
            .ns_config(ns)
            .ok_or_else(|| SqlError::Other(format!("no schema mapping for {ns}")))?;
        let mut out = BTreeMap::new();
        out.insert(cfg.primary_key.clone(), id.clone());
        Ok(out)
    }

    async fn delete_ns(&self, ns: &Namespace, selector: &Document) -> Result<(), SqlError> {
        let cfg = self
            .schema
            .ns_config(ns)
            .ok_or_else(|| SqlError::Other(format!("no schema mapping for {ns}")))?;

        let id_bson = selector
            .get("_id")
            .ok_or_else(|| SqlError::Other("delete selector missing _id".to_string()))?;
        let id = value::from_bson(id_bson);

        let sql = format!("DELETE FROM {} WHERE {} = $1", cfg.table, cfg.primary_key);
        self.adapter.exec_params(&sql, std::slice::from_ref(&id)).await?;
        Ok(())
    }
}
