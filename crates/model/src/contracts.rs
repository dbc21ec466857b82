//! Trait contracts for the three external collaborators the core depends
//! on but does not implement internals for (§1, §6): the schema loader,
//! the SQL adapter, and the tailer. A fourth contract, `SourceDriver`,
//! covers the subset of the Mongo-compatible driver the importer and the
//! mutator-update resync path need directly.
//!
//! Concrete implementations live in the `connectors` crate; the core
//! (`engine-core`, `engine-processing`) only ever talks to these traits.

use crate::{
    namespace::Namespace,
    oplog::OplogEntry,
    row::RowTuple,
    timestamp::ResumeTimestamp,
    value::Value,
};
use async_trait::async_trait;
use bson::Document;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by the source driver (the Mongo-compatible cursor /
/// connection layer). Mirrors §7's transient vs. fatal-now split.
#[derive(Debug, Error, Clone)]
pub enum SourceError {
    #[error("source connection failure: {0}")]
    Connection(String),

    #[error("source operation failure: {0}")]
    Operation(String),

    #[error("duplicate key error (code {code})")]
    DuplicateKey { code: u32 },

    #[error("cursor invalidated: {0}")]
    CursorInvalidated(String),

    #[error("source error: {0}")]
    Other(String),
}

impl SourceError {
    /// Matches the fatal-now message pattern from §4.1: a cursor
    /// invalidation always starts with this literal text.
    pub const CURSOR_NOT_FOUND_PREFIX: &'static str = "Query response returned CURSOR_NOT_FOUND";
}

/// Errors raised by the SQL adapter writing to the target.
#[derive(Debug, Error, Clone)]
pub enum SqlError {
    #[error("database error: {0}")]
    Database(String),

    /// A database error that carries a structured server-side result
    /// object (e.g. a Postgres error with a SQLSTATE and detail fields).
    /// The exception shield only swallows errors of this shape.
    #[error("database error with structured result: {0}")]
    Structured(String),

    #[error("adapter error: {0}")]
    Other(String),
}

impl SqlError {
    pub fn has_structured_result(&self) -> bool {
        matches!(self, SqlError::Structured(_))
    }
}

/// Errors raised by the tailer (resume-timestamp persistence, oplog chunk
/// delivery).
#[derive(Debug, Error, Clone)]
pub enum TailerError {
    #[error("tailer storage error: {0}")]
    Storage(String),

    #[error("tailer stream error: {0}")]
    Stream(String),
}

/// The symbolic kind of SQL backend an adapter speaks, used only to gate
/// the unsafe-skip behavior onto PostgreSQL (§4.3, Design Notes
/// "Polymorphism").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    Postgres,
    Other,
}

/// A handle to one target table.
#[async_trait]
pub trait TableHandle: Send + Sync {
    fn name(&self) -> &str;

    async fn truncate(&self) -> Result<(), SqlError>;

    /// Unspecified by §6 beyond its name; no core operation depends on it.
    fn first_source(&self) -> Option<&str> {
        None
    }
}

/// Per-database, per-namespace column/table mapping, and the document →
/// row-tuple transform (§3 "Schema spec").
#[async_trait]
pub trait SchemaLoader: Send + Sync {
    /// Every source database this schema spec configures a mapping for.
    fn configured_databases(&self) -> Vec<String>;

    /// Every source collection configured within one database, in the
    /// schema spec's iteration order.
    fn configured_collections(&self, db: &str) -> Vec<String>;

    fn find_ns(&self, ns: &Namespace) -> bool;

    fn all_columns(&self, ns: &Namespace) -> Option<Vec<String>>;

    fn primary_sql_key_for_ns(&self, ns: &Namespace) -> Option<String>;

    /// Maps one source document to an ordered row tuple; column order
    /// matches `all_columns`.
    fn transform(&self, ns: &Namespace, doc: &Document) -> Option<RowTuple>;

    /// Target table name for a namespace (shared tables are legal: two
    /// namespaces may resolve to the same table name).
    fn table_for_ns(&self, ns: &Namespace) -> Option<String>;

    /// Idempotent DDL application; drops first unless `drop_first` is false.
    async fn create_schema(&self, db: &str, drop_first: bool) -> Result<(), SqlError>;

    /// Bulk loader entry point; may raise a database error, in which case
    /// the bulk writer degrades to per-row upserts.
    async fn copy_data(&self, db: &str, ns: &Namespace, rows: &[RowTuple]) -> Result<(), SqlError>;
}

/// The SQL adapter: table handles and column-wise upsert/delete (§6).
#[async_trait]
pub trait SqlAdapter: Send + Sync {
    fn adapter_scheme(&self) -> AdapterKind;

    async fn table_for_ns(&self, ns: &Namespace) -> Result<Arc<dyn TableHandle>, SqlError>;

    /// Single-row upsert given an already zipped column→value map.
    async fn upsert(
        &self,
        table: &dyn TableHandle,
        primary_key_column: &str,
        row: &BTreeMap<String, Value>,
    ) -> Result<(), SqlError>;

    /// Namespace-level upsert; the adapter performs its own transform.
    async fn upsert_ns(&self, ns: &Namespace, doc: &Document) -> Result<(), SqlError>;

    /// Extracts the translated primary-key value for one source `_id`,
    /// used to build a targeted delete after a mutator update resync
    /// finds the document gone.
    async fn transform_one_ns(
        &self,
        ns: &Namespace,
        id: &Value,
    ) -> Result<BTreeMap<String, Value>, SqlError>;

    async fn delete_ns(&self, ns: &Namespace, selector: &Document) -> Result<(), SqlError>;
}

/// Persists the resume timestamp and streams oplog entries in order (§6).
#[async_trait]
pub trait Tailer: Send + Sync {
    async fn read_timestamp(&self) -> Result<ResumeTimestamp, TailerError>;

    async fn write_timestamp(&self, ts: ResumeTimestamp) -> Result<(), TailerError>;

    /// Positions the tailer at an explicit timestamp, or at
    /// `read_timestamp()` if `None`.
    async fn tail_from(&mut self, ts: Option<ResumeTimestamp>) -> Result<(), TailerError>;

    /// Pulls up to `batch_size` oplog entries, in order.
    async fn next_chunk(&mut self, batch_size: usize) -> Result<Vec<OplogEntry>, TailerError>;
}

/// A scan cursor over one source collection, yielded by `SourceDriver::scan`.
#[async_trait]
pub trait SourceCursor: Send {
    async fn next(&mut self) -> Result<Option<Document>, SourceError>;
}

/// The subset of the Mongo-compatible driver the importer and the
/// mutator-update resync path talk to directly (§6).
#[async_trait]
pub trait SourceDriver: Send + Sync {
    async fn database_names(&self) -> Result<Vec<String>, SourceError>;

    async fn scan(
        &self,
        db: &str,
        collection: &str,
        batch_size: usize,
    ) -> Result<Box<dyn SourceCursor>, SourceError>;

    async fn find_one(&self, ns: &Namespace, id: &Value) -> Result<Option<Document>, SourceError>;

    /// The oplog's most recent timestamp, queried in reverse natural order.
    async fn oplog_start_ts(&self) -> Result<ResumeTimestamp, SourceError>;
}
