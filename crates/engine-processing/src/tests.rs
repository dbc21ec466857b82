//! Scenario tests against the fakes below, covering the cases spec §8
//! enumerates: cold start, replacement update, mutator update with the
//! document present/absent, an index-build insert, and a bulk-copy
//! failure falling back to per-row upserts under `unsafe`.

use crate::{
    bulk_writer::BulkWriter,
    importer::{ImportOptions, Importer},
    interpreter::{Interpreter, InterpreterOptions},
};
use async_trait::async_trait;
use bson::{doc, Bson, Document};
use engine_core::{ImportMetrics, StopFlag};
use model::{
    batch::Batch,
    contracts::{
        AdapterKind, SchemaLoader, SourceCursor, SourceDriver, SourceError, SqlAdapter, SqlError,
        TableHandle, Tailer, TailerError,
    },
    namespace::Namespace,
    oplog::OplogEntry,
    row::RowTuple,
    timestamp::ResumeTimestamp,
    value::{self, Value},
};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    UpsertNs(String, Document),
    Delete(String, Document),
    UpsertRow(String),
}

#[derive(Default)]
struct FakeLog(Mutex<Vec<Call>>);

impl FakeLog {
    fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }
}

/// Matches any namespace in database "d"; only "d.c" has a column
/// mapping, so e.g. "d.system.indexes" passes the namespace gate but
/// produces no transform — the interpreter's own `is_system_indexes`
/// check is what actually suppresses the SQL call.
struct FakeSchema;

#[async_trait]
impl SchemaLoader for FakeSchema {
    fn configured_databases(&self) -> Vec<String> {
        vec!["d".to_string()]
    }

    fn configured_collections(&self, _db: &str) -> Vec<String> {
        vec!["c".to_string()]
    }

    fn find_ns(&self, ns: &Namespace) -> bool {
        ns.database() == "d"
    }

    fn all_columns(&self, ns: &Namespace) -> Option<Vec<String>> {
        (ns.collection() == "c").then(|| vec!["id".to_string(), "name".to_string(), "n".to_string()])
    }

    fn primary_sql_key_for_ns(&self, ns: &Namespace) -> Option<String> {
        (ns.collection() == "c").then(|| "id".to_string())
    }

    fn transform(&self, ns: &Namespace, doc: &Document) -> Option<RowTuple> {
        if ns.collection() != "c" {
            return None;
        }
        let id = doc.get("_id").map(value::from_bson).unwrap_or(Value::Null);
        let name = doc.get("name").map(value::from_bson).unwrap_or(Value::Null);
        let n = doc.get("n").map(value::from_bson).unwrap_or(Value::Null);
        Some(RowTuple::new(vec![id, name, n]))
    }

    fn table_for_ns(&self, ns: &Namespace) -> Option<String> {
        (ns.collection() == "c").then(|| "c_table".to_string())
    }

    async fn create_schema(&self, _db: &str, _drop_first: bool) -> Result<(), SqlError> {
        Ok(())
    }

    async fn copy_data(&self, _db: &str, _ns: &Namespace, _rows: &[RowTuple]) -> Result<(), SqlError> {
        Ok(())
    }
}

struct FakeTable(String);

#[async_trait]
impl TableHandle for FakeTable {
    fn name(&self) -> &str {
        &self.0
    }

    async fn truncate(&self) -> Result<(), SqlError> {
        Ok(())
    }
}

struct FakeAdapter {
    log: Arc<FakeLog>,
}

#[async_trait]
impl SqlAdapter for FakeAdapter {
    fn adapter_scheme(&self) -> AdapterKind {
        AdapterKind::Postgres
    }

    async fn table_for_ns(&self, ns: &Namespace) -> Result<Arc<dyn TableHandle>, SqlError> {
        Ok(Arc::new(FakeTable(ns.as_str().to_string())))
    }

    async fn upsert(
        &self,
        _table: &dyn TableHandle,
        _primary_key_column: &str,
        _row: &BTreeMap<String, Value>,
    ) -> Result<(), SqlError> {
        Ok(())
    }

    async fn upsert_ns(&self, ns: &Namespace, doc: &Document) -> Result<(), SqlError> {
        self.log.push(Call::UpsertNs(ns.as_str().to_string(), doc.clone()));
        Ok(())
    }

    async fn transform_one_ns(
        &self,
        _ns: &Namespace,
        id: &Value,
    ) -> Result<BTreeMap<String, Value>, SqlError> {
        let mut out = BTreeMap::new();
        out.insert("id".to_string(), id.clone());
        Ok(out)
    }

    async fn delete_ns(&self, ns: &Namespace, selector: &Document) -> Result<(), SqlError> {
        self.log.push(Call::Delete(ns.as_str().to_string(), selector.clone()));
        Ok(())
    }
}

struct FakeCursor;

#[async_trait]
impl SourceCursor for FakeCursor {
    async fn next(&mut self) -> Result<Option<Document>, SourceError> {
        Ok(None)
    }
}

/// `find_one` returns whatever `next_find_one_result` is set to, letting
/// each test pick "document present" vs. "document deleted".
struct FakeSource {
    find_one_result: Mutex<Option<Document>>,
}

#[async_trait]
impl SourceDriver for FakeSource {
    async fn database_names(&self) -> Result<Vec<String>, SourceError> {
        Ok(vec!["d".to_string()])
    }

    async fn scan(&self, _db: &str, _collection: &str, _batch_size: usize) -> Result<Box<dyn SourceCursor>, SourceError> {
        Ok(Box::new(FakeCursor))
    }

    async fn find_one(&self, _ns: &Namespace, _id: &Value) -> Result<Option<Document>, SourceError> {
        Ok(self.find_one_result.lock().unwrap().clone())
    }

    async fn oplog_start_ts(&self) -> Result<model::timestamp::ResumeTimestamp, SourceError> {
        Ok(model::timestamp::ResumeTimestamp::ZERO)
    }
}

fn build_interpreter(find_one_result: Option<Document>) -> (Interpreter, Arc<FakeLog>) {
    let log = Arc::new(FakeLog::default());
    let schema = Arc::new(FakeSchema);
    let adapter = Arc::new(FakeAdapter { log: log.clone() });
    let source = Arc::new(FakeSource { find_one_result: Mutex::new(find_one_result) });
    let interpreter = Interpreter::new(schema, adapter, source, InterpreterOptions::default());
    (interpreter, log)
}

#[tokio::test]
async fn replacement_update_merges_selector_id_and_upserts_without_source_read() {
    let (interpreter, log) = build_interpreter(None);
    let entry = model::oplog::OplogEntry::from_raw(&doc! {
        "ns": "d.c", "op": "u",
        "o2": { "_id": 42 },
        "o": { "name": "x" },
    });

    interpreter.apply(&entry).await.unwrap();

    let calls = log.calls();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        Call::UpsertNs(ns, doc) => {
            assert_eq!(ns, "d.c");
            assert_eq!(doc.get("_id"), Some(&Bson::Int32(42)));
            assert_eq!(doc.get_str("name"), Ok("x"));
        }
        other => panic!("expected upsert_ns, got {other:?}"),
    }
}

#[tokio::test]
async fn mutator_update_with_document_present_resyncs_from_source() {
    let found = doc! { "_id": 42, "n": 1, "name": "x" };
    let (interpreter, log) = build_interpreter(Some(found.clone()));
    let entry = model::oplog::OplogEntry::from_raw(&doc! {
        "ns": "d.c", "op": "u",
        "o2": { "_id": 42 },
        "o": { "$set": { "n": 1 } },
    });

    interpreter.apply(&entry).await.unwrap();

    let calls = log.calls();
    assert_eq!(calls, vec![Call::UpsertNs("d.c".to_string(), found)]);
}

#[tokio::test]
async fn mutator_update_with_document_deleted_issues_targeted_delete() {
    let (interpreter, log) = build_interpreter(None);
    let entry = model::oplog::OplogEntry::from_raw(&doc! {
        "ns": "d.c", "op": "u",
        "o2": { "_id": 42 },
        "o": { "$set": { "n": 1 } },
    });

    interpreter.apply(&entry).await.unwrap();

    let calls = log.calls();
    assert_eq!(calls.len(), 1);
    assert!(matches!(&calls[0], Call::Delete(ns, _) if ns == "d.c"));
}

#[tokio::test]
async fn insert_into_system_indexes_is_skipped() {
    let (interpreter, log) = build_interpreter(None);
    let entry = model::oplog::OplogEntry::from_raw(&doc! {
        "ns": "d.system.indexes", "op": "i",
        "o": { "key": { "a": 1 } },
    });

    interpreter.apply(&entry).await.unwrap();

    assert!(log.calls().is_empty());
}

#[tokio::test]
async fn delete_is_dropped_when_ignore_delete_is_set() {
    let log = Arc::new(FakeLog::default());
    let schema = Arc::new(FakeSchema);
    let adapter = Arc::new(FakeAdapter { log: log.clone() });
    let source = Arc::new(FakeSource { find_one_result: Mutex::new(None) });
    let interpreter = Interpreter::new(
        schema,
        adapter,
        source,
        InterpreterOptions { ignore_delete: true, unsafe_mode: false },
    );

    let entry = model::oplog::OplogEntry::from_raw(&doc! {
        "ns": "d.c", "op": "d",
        "o": { "_id": 42 },
    });
    interpreter.apply(&entry).await.unwrap();

    assert!(log.calls().is_empty());
}

#[tokio::test]
async fn unconfigured_namespace_is_dropped_without_a_sql_call() {
    let (interpreter, log) = build_interpreter(None);
    let entry = model::oplog::OplogEntry::from_raw(&doc! {
        "ns": "other.c", "op": "i",
        "o": { "_id": 1, "name": "x" },
    });

    interpreter.apply(&entry).await.unwrap();

    assert!(log.calls().is_empty());
}

// --- scenario 6: bulk failure falls back to per-row upserts under unsafe ---

/// A schema whose `copy_data` always fails, forcing the bulk writer onto
/// its per-row fallback path.
struct FailingCopySchema;

#[async_trait]
impl SchemaLoader for FailingCopySchema {
    fn configured_databases(&self) -> Vec<String> {
        vec![]
    }

    fn configured_collections(&self, _db: &str) -> Vec<String> {
        vec![]
    }

    fn find_ns(&self, _ns: &Namespace) -> bool {
        true
    }

    fn all_columns(&self, _ns: &Namespace) -> Option<Vec<String>> {
        Some(vec!["id".to_string(), "name".to_string()])
    }

    fn primary_sql_key_for_ns(&self, _ns: &Namespace) -> Option<String> {
        Some("id".to_string())
    }

    fn transform(&self, _ns: &Namespace, _doc: &Document) -> Option<RowTuple> {
        None
    }

    fn table_for_ns(&self, _ns: &Namespace) -> Option<String> {
        Some("c_table".to_string())
    }

    async fn create_schema(&self, _db: &str, _drop_first: bool) -> Result<(), SqlError> {
        Ok(())
    }

    async fn copy_data(&self, _db: &str, _ns: &Namespace, _rows: &[RowTuple]) -> Result<(), SqlError> {
        Err(SqlError::Database("bulk copy unavailable".to_string()))
    }
}

/// Upserts every row except the one whose `id` column is `"2"`, which
/// fails with a structured Postgres-shaped error — the "one poisoned row
/// in an otherwise clean batch" shape spec §8 scenario 6 describes.
struct PerRowFakeAdapter {
    log: Arc<FakeLog>,
}

#[async_trait]
impl SqlAdapter for PerRowFakeAdapter {
    fn adapter_scheme(&self) -> AdapterKind {
        AdapterKind::Postgres
    }

    async fn table_for_ns(&self, ns: &Namespace) -> Result<Arc<dyn TableHandle>, SqlError> {
        Ok(Arc::new(FakeTable(ns.as_str().to_string())))
    }

    async fn upsert(
        &self,
        _table: &dyn TableHandle,
        _primary_key_column: &str,
        row: &BTreeMap<String, Value>,
    ) -> Result<(), SqlError> {
        let id = row.get("id").map(|v| v.to_string()).unwrap_or_default();
        if id == "2" {
            Err(SqlError::Structured("bad type for row 2".to_string()))
        } else {
            self.log.push(Call::UpsertRow(id));
            Ok(())
        }
    }

    async fn upsert_ns(&self, _ns: &Namespace, _doc: &Document) -> Result<(), SqlError> {
        Ok(())
    }

    async fn transform_one_ns(
        &self,
        _ns: &Namespace,
        id: &Value,
    ) -> Result<BTreeMap<String, Value>, SqlError> {
        let mut out = BTreeMap::new();
        out.insert("id".to_string(), id.clone());
        Ok(out)
    }

    async fn delete_ns(&self, _ns: &Namespace, _selector: &Document) -> Result<(), SqlError> {
        Ok(())
    }
}

#[tokio::test]
async fn bulk_copy_failure_falls_back_to_per_row_and_swallows_the_poisoned_row_under_unsafe() {
    let log = Arc::new(FakeLog::default());
    let schema = Arc::new(FailingCopySchema);
    let adapter = Arc::new(PerRowFakeAdapter { log: log.clone() });
    let writer = BulkWriter::new(schema, adapter, true, ImportMetrics::new());

    let ns = Namespace::parse("d.c").unwrap();
    let mut batch = Batch::new();
    batch.push(RowTuple::new(vec![Value::Int(1), Value::String("a".to_string())]));
    batch.push(RowTuple::new(vec![Value::Int(2), Value::String("bad".to_string())]));
    batch.push(RowTuple::new(vec![Value::Int(3), Value::String("c".to_string())]));

    let result = writer.write_batch("d", &ns, &mut batch).await;

    assert!(result.is_ok(), "unsafe mode must swallow the poisoned row, not surface it");
    assert_eq!(
        log.calls(),
        vec![Call::UpsertRow("1".to_string()), Call::UpsertRow("3".to_string())]
    );
}

#[tokio::test]
async fn bulk_copy_failure_reraises_the_poisoned_row_when_unsafe_is_unset() {
    let log = Arc::new(FakeLog::default());
    let schema = Arc::new(FailingCopySchema);
    let adapter = Arc::new(PerRowFakeAdapter { log: log.clone() });
    let writer = BulkWriter::new(schema, adapter, false, ImportMetrics::new());

    let ns = Namespace::parse("d.c").unwrap();
    let mut batch = Batch::new();
    batch.push(RowTuple::new(vec![Value::Int(1), Value::String("a".to_string())]));
    batch.push(RowTuple::new(vec![Value::Int(2), Value::String("bad".to_string())]));

    let result = writer.write_batch("d", &ns, &mut batch).await;

    assert!(result.is_err());
    assert_eq!(log.calls(), vec![Call::UpsertRow("1".to_string())]);
}

// --- scenario 1: cold start captures start_ts before the scan and
// persists it to the tailer only after the scan completes ---

#[derive(Default)]
struct CallOrderLog(Mutex<Vec<&'static str>>);

impl CallOrderLog {
    fn push(&self, tag: &'static str) {
        self.0.lock().unwrap().push(tag);
    }

    fn calls(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().clone()
    }
}

/// Yields the configured documents in order, then signals exhaustion.
struct VecCursor(Vec<Document>);

#[async_trait]
impl SourceCursor for VecCursor {
    async fn next(&mut self) -> Result<Option<Document>, SourceError> {
        if self.0.is_empty() {
            Ok(None)
        } else {
            Ok(Some(self.0.remove(0)))
        }
    }
}

/// Records the order `oplog_start_ts` and `scan` are called in, the
/// invariant spec §3 requires: "the resume timestamp is captured before
/// the import scan begins, never after."
struct SequencedSource {
    log: Arc<CallOrderLog>,
    docs: Vec<Document>,
}

#[async_trait]
impl SourceDriver for SequencedSource {
    async fn database_names(&self) -> Result<Vec<String>, SourceError> {
        Ok(vec!["d".to_string()])
    }

    async fn scan(&self, _db: &str, _collection: &str, _batch_size: usize) -> Result<Box<dyn SourceCursor>, SourceError> {
        self.log.push("scan");
        Ok(Box::new(VecCursor(self.docs.clone())))
    }

    async fn find_one(&self, _ns: &Namespace, _id: &Value) -> Result<Option<Document>, SourceError> {
        Ok(None)
    }

    async fn oplog_start_ts(&self) -> Result<ResumeTimestamp, SourceError> {
        self.log.push("oplog_start_ts");
        Ok(ResumeTimestamp::from_secs(100))
    }
}

#[derive(Default)]
struct FakeTailer {
    position: Mutex<ResumeTimestamp>,
}

#[async_trait]
impl Tailer for FakeTailer {
    async fn read_timestamp(&self) -> Result<ResumeTimestamp, TailerError> {
        Ok(*self.position.lock().unwrap())
    }

    async fn write_timestamp(&self, ts: ResumeTimestamp) -> Result<(), TailerError> {
        *self.position.lock().unwrap() = ts;
        Ok(())
    }

    async fn tail_from(&mut self, _ts: Option<ResumeTimestamp>) -> Result<(), TailerError> {
        Ok(())
    }

    async fn next_chunk(&mut self, _batch_size: usize) -> Result<Vec<OplogEntry>, TailerError> {
        Ok(vec![])
    }
}

#[tokio::test]
async fn cold_start_captures_start_ts_before_scan_and_persists_it_after() {
    let order = Arc::new(CallOrderLog::default());
    let schema = Arc::new(FakeSchema);
    let sql_log = Arc::new(FakeLog::default());
    let adapter = Arc::new(FakeAdapter { log: sql_log });
    let source = Arc::new(SequencedSource {
        log: order.clone(),
        docs: vec![doc! { "_id": 1, "name": "x", "n": 1 }],
    });
    let tailer: Arc<AsyncMutex<dyn Tailer>> = Arc::new(AsyncMutex::new(FakeTailer::default()));
    let writer = BulkWriter::new(schema.clone(), adapter.clone(), false, ImportMetrics::new());
    let importer = Importer::new(source, schema, adapter, tailer.clone(), writer, StopFlag::new());

    importer.run(&ImportOptions::default()).await.unwrap();

    assert_eq!(order.calls(), vec!["oplog_start_ts", "scan"]);
    assert_eq!(
        tailer.lock().await.read_timestamp().await.unwrap(),
        ResumeTimestamp::from_secs(100)
    );
}

#[tokio::test]
async fn skip_tail_never_touches_the_tailers_resume_timestamp() {
    let order = Arc::new(CallOrderLog::default());
    let schema = Arc::new(FakeSchema);
    let sql_log = Arc::new(FakeLog::default());
    let adapter = Arc::new(FakeAdapter { log: sql_log });
    let source = Arc::new(SequencedSource { log: order.clone(), docs: vec![] });
    let tailer: Arc<AsyncMutex<dyn Tailer>> = Arc::new(AsyncMutex::new(FakeTailer::default()));
    let writer = BulkWriter::new(schema.clone(), adapter.clone(), false, ImportMetrics::new());
    let importer = Importer::new(source, schema, adapter, tailer.clone(), writer, StopFlag::new());

    importer
        .run(&ImportOptions { no_drop_tables: false, skip_tail: true })
        .await
        .unwrap();

    assert!(!order.calls().contains(&"oplog_start_ts"));
    assert_eq!(tailer.lock().await.read_timestamp().await.unwrap(), ResumeTimestamp::ZERO);
}
