use crate::{config::Config, error::RuntimeError};
use async_trait::async_trait;
use connectors::{MongoSource, PgAdapter, PostgresTarget, SchemaConfig, SledTailer};
use engine_core::{ImportMetrics, StopFlag};
use engine_processing::{BulkWriter, ImportOptions, Importer, Interpreter, InterpreterOptions, TailLoop};
use model::{
    contracts::{SchemaLoader, SourceDriver, SqlAdapter, Tailer, TailerError},
    oplog::OplogEntry,
    timestamp::ResumeTimestamp,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Delegates every `Tailer` call through a shared, lockable tailer so the
/// importer (which only ever calls `write_timestamp`) and the tail loop
/// (which needs exclusive `&mut self` access while it runs) can both be
/// handed a view of the same underlying tailer (C7, §4.7).
struct SharedTailer(Arc<Mutex<dyn Tailer>>);

#[async_trait]
impl Tailer for SharedTailer {
    async fn read_timestamp(&self) -> Result<ResumeTimestamp, TailerError> {
        self.0.lock().await.read_timestamp().await
    }

    async fn write_timestamp(&self, ts: ResumeTimestamp) -> Result<(), TailerError> {
        self.0.lock().await.write_timestamp(ts).await
    }

    async fn tail_from(&mut self, ts: Option<ResumeTimestamp>) -> Result<(), TailerError> {
        self.0.lock().await.tail_from(ts).await
    }

    async fn next_chunk(&mut self, batch_size: usize) -> Result<Vec<OplogEntry>, TailerError> {
        self.0.lock().await.next_chunk(batch_size).await
    }
}

/// Owns live connections to the source and target plus the persisted
/// tailer, and decides whether to run the importer and when to hand
/// control to the tail loop (C7, §4.7). A typical run calls `import()`
/// then `optail()`.
pub struct Orchestrator {
    source: Arc<dyn SourceDriver>,
    schema: Arc<dyn SchemaLoader>,
    adapter: Arc<dyn SqlAdapter>,
    tailer: Arc<Mutex<dyn Tailer>>,
    stop: StopFlag,
    config: Config,
}

impl Orchestrator {
    pub async fn connect(config: Config, stop: StopFlag) -> Result<Self, RuntimeError> {
        let mongo = MongoSource::connect(&config.source_uri).await?;
        let pg = PgAdapter::connect(&config.target_uri).await?;

        let schema_text = std::fs::read_to_string(&config.schema_path)?;
        let schema_config = SchemaConfig::from_yaml(&schema_text)?;
        let target = Arc::new(PostgresTarget::new(pg, schema_config));

        let tailer: Arc<Mutex<dyn Tailer>> =
            Arc::new(Mutex::new(SledTailer::open(&config.tailer_path, mongo.clone())?));

        Ok(Orchestrator {
            source: Arc::new(mongo),
            schema: target.clone(),
            adapter: target,
            tailer,
            stop,
            config,
        })
    }

    /// If `reimport` is set, or the tailer has never run, invoke the
    /// importer; otherwise no-op (§4.7).
    pub async fn import(&self) -> Result<(), RuntimeError> {
        let never_ran = self.tailer.lock().await.read_timestamp().await?.is_zero();
        if !should_import(self.config.reimport, never_ran) {
            info!("resume timestamp already set and reimport not requested, skipping import");
            return Ok(());
        }

        let writer = BulkWriter::new(
            self.schema.clone(),
            self.adapter.clone(),
            self.config.unsafe_mode,
            ImportMetrics::new(),
        );
        let importer = Importer::new(
            self.source.clone(),
            self.schema.clone(),
            self.adapter.clone(),
            self.tailer.clone(),
            writer,
            self.stop.clone(),
        );

        importer
            .run(&ImportOptions {
                no_drop_tables: self.config.no_drop_tables,
                skip_tail: self.config.skip_tail,
            })
            .await?;
        Ok(())
    }

    /// Enters the tail loop and runs until the stop flag trips (§4.6).
    pub async fn optail(&self) -> Result<(), RuntimeError> {
        let interpreter = Interpreter::new(
            self.schema.clone(),
            self.adapter.clone(),
            self.source.clone(),
            InterpreterOptions {
                ignore_delete: self.config.ignore_delete,
                unsafe_mode: self.config.unsafe_mode,
            },
        );

        let tail_from = self.config.tail_from.map(ResumeTimestamp::from_secs);
        let tailer = Box::new(SharedTailer(self.tailer.clone()));
        let mut tail_loop = TailLoop::new(tailer, interpreter, self.stop.clone());
        tail_loop.run(tail_from).await?;
        Ok(())
    }

    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }
}

/// The decision spec.md §4.7 and §8 scenario 1 name: import runs when the
/// tailer has never run, or when the operator forces it with `reimport`.
fn should_import(reimport: bool, never_ran: bool) -> bool {
    reimport || never_ran
}
