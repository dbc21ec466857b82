use crate::mongo::MongoSource;
use async_trait::async_trait;
use model::{
    contracts::{Tailer, TailerError},
    oplog::OplogEntry,
    timestamp::ResumeTimestamp,
};
use tracing::debug;

const RESUME_KEY: &[u8] = b"resume_ts";

/// Persists the resume timestamp in a `sled` tree and pulls oplog chunks
/// from a live `MongoSource`, in the same spirit as the teacher's
/// sled-backed checkpoint store: a small local database standing in for
/// the "save the world's state between runs" half of the tailer (§4.6).
pub struct SledTailer {
    db: sled::Db,
    source: MongoSource,
    position: ResumeTimestamp,
}

impl SledTailer {
    pub fn open(path: &std::path::Path, source: MongoSource) -> Result<Self, TailerError> {
        let db = sled::open(path).map_err(|e| TailerError::Storage(e.to_string()))?;
        Ok(SledTailer { db, source, position: ResumeTimestamp::ZERO })
    }
}

#[async_trait]
impl Tailer for SledTailer {
    async fn read_timestamp(&self) -> Result<ResumeTimestamp, TailerError> {
        match self.db.get(RESUME_KEY).map_err(|e| TailerError::Storage(e.to_string()))? {
            Some(bytes) => bincode::deserialize(&bytes)
                .map_err(|e| TailerError::Storage(e.to_string())),
            None => Ok(ResumeTimestamp::ZERO),
        }
    }

    async fn write_timestamp(&self, ts: ResumeTimestamp) -> Result<(), TailerError> {
        let bytes = bincode::serialize(&ts).map_err(|e| TailerError::Storage(e.to_string()))?;
        self.db
            .insert(RESUME_KEY, bytes)
            .map_err(|e| TailerError::Storage(e.to_string()))?;
        self.db.flush_async().await.map_err(|e| TailerError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn tail_from(&mut self, ts: Option<ResumeTimestamp>) -> Result<(), TailerError> {
        self.position = match ts {
            Some(ts) => ts,
            None => self.read_timestamp().await?,
        };
        debug!(time = self.position.time, increment = self.position.increment, "tailer positioned");
        Ok(())
    }

    async fn next_chunk(&mut self, batch_size: usize) -> Result<Vec<OplogEntry>, TailerError> {
        let raw = self
            .source
            .oplog_chunk(self.position, batch_size)
            .await
            .map_err(|e| TailerError::Stream(e.to_string()))?;

        let mut entries = Vec::with_capacity(raw.len());
        for doc in &raw {
            if let Ok(ts) = doc.get_timestamp("ts") {
                self.position = ResumeTimestamp::from(ts);
            }
            entries.push(OplogEntry::from_raw(doc));
        }

        if !raw.is_empty() {
            self.write_timestamp(self.position).await?;
        }

        Ok(entries)
    }
}
