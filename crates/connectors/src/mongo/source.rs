use crate::mongo::error::classify_mongo_driver_error;
use async_trait::async_trait;
use bson::{doc, Document};
use futures_util::TryStreamExt;
use model::{
    contracts::{SourceCursor, SourceDriver, SourceError},
    namespace::Namespace,
    timestamp::ResumeTimestamp,
    value::Value,
};
use mongodb::{options::FindOptions, Client};
use tracing::debug;

/// A thin wrapper over the `mongodb` driver exposing exactly the
/// operations §6 lists for the source driver, including access to the
/// oplog pseudo-collection for `start_ts` discovery.
#[derive(Clone)]
pub struct MongoSource {
    client: Client,
}

impl MongoSource {
    pub async fn connect(uri: &str) -> Result<Self, SourceError> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| classify_mongo_driver_error(&e))?;
        Ok(MongoSource { client })
    }
}

#[async_trait]
impl SourceDriver for MongoSource {
    async fn database_names(&self) -> Result<Vec<String>, SourceError> {
        self.client
            .list_database_names()
            .await
            .map_err(|e| classify_mongo_driver_error(&e))
    }

    async fn scan(
        &self,
        db: &str,
        collection: &str,
        batch_size: usize,
    ) -> Result<Box<dyn SourceCursor>, SourceError> {
        let coll = self
            .client
            .database(db)
            .collection::<Document>(collection);

        let options = FindOptions::builder()
            .batch_size(batch_size as u32)
            .build();

        let cursor = coll
            .find(doc! {})
            .with_options(options)
            .await
            .map_err(|e| classify_mongo_driver_error(&e))?;

        Ok(Box::new(MongoCursor { cursor }))
    }

    async fn find_one(&self, ns: &Namespace, id: &Value) -> Result<Option<Document>, SourceError> {
        let coll = self
            .client
            .database(ns.database())
            .collection::<Document>(ns.collection());

        let filter = doc! { "_id": value_to_bson(id) };

        coll.find_one(filter)
            .await
            .map_err(|e| classify_mongo_driver_error(&e))
    }

    async fn oplog_start_ts(&self) -> Result<ResumeTimestamp, SourceError> {
        let coll = self
            .client
            .database("local")
            .collection::<Document>("oplog.rs");

        let options = FindOptions::builder()
            .sort(doc! { "$natural": -1 })
            .limit(1)
            .build();

        let mut cursor = coll
            .find(doc! {})
            .with_options(options)
            .await
            .map_err(|e| classify_mongo_driver_error(&e))?;

        let latest = cursor
            .try_next()
            .await
            .map_err(|e| classify_mongo_driver_error(&e))?;

        match latest.and_then(|doc| doc.get_timestamp("ts").ok()) {
            Some(ts) => {
                debug!(time = ts.time, increment = ts.increment, "discovered oplog start_ts");
                Ok(ResumeTimestamp::from(ts))
            }
            None => Ok(ResumeTimestamp::ZERO),
        }
    }
}

impl MongoSource {
    /// Pulls up to `limit` oplog entries strictly after `since`, in
    /// natural (insertion) order. Used only by the tailer — this query
    /// shape is specific to MongoDB's oplog and has no place on the
    /// `SourceDriver` trait the importer depends on.
    pub async fn oplog_chunk(
        &self,
        since: ResumeTimestamp,
        limit: usize,
    ) -> Result<Vec<Document>, SourceError> {
        let coll = self
            .client
            .database("local")
            .collection::<Document>("oplog.rs");

        let filter = doc! { "ts": { "$gt": bson::Bson::Timestamp(since.into()) } };
        let options = FindOptions::builder()
            .sort(doc! { "$natural": 1 })
            .limit(limit as i64)
            .build();

        let mut cursor = coll
            .find(filter)
            .with_options(options)
            .await
            .map_err(|e| classify_mongo_driver_error(&e))?;

        let mut out = Vec::with_capacity(limit);
        while let Some(doc) = cursor
            .try_next()
            .await
            .map_err(|e| classify_mongo_driver_error(&e))?
        {
            out.push(doc);
        }
        Ok(out)
    }
}

struct MongoCursor {
    cursor: mongodb::Cursor<Document>,
}

#[async_trait]
impl SourceCursor for MongoCursor {
    async fn next(&mut self) -> Result<Option<Document>, SourceError> {
        self.cursor
            .try_next()
            .await
            .map_err(|e| classify_mongo_driver_error(&e))
    }
}

/// Converts a target-side `Value` back into BSON for use in a source
/// query filter (the `_id` lookup for `find_one`).
fn value_to_bson(value: &Value) -> bson::Bson {
    match value {
        Value::Int(v) => bson::Bson::Int64(*v),
        Value::Float(v) => bson::Bson::Double(*v),
        Value::String(v) => bson::Bson::String(v.clone()),
        Value::Boolean(v) => bson::Bson::Boolean(*v),
        Value::Null => bson::Bson::Null,
        other => bson::Bson::String(other.to_string()),
    }
}
