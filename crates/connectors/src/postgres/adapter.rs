use crate::postgres::{encoder::encode_copy_line, params::PgParamStore};
use futures_util::SinkExt;
use model::{contracts::SqlError, value::Value};
use std::sync::Arc;
use tokio_postgres::{Config, NoTls};
use tracing::{error, warn};

/// A thin wrapper over one `tokio_postgres::Client`, grounding §6's SQL
/// adapter on top of a single live connection. `Client`'s own methods
/// already take `&self`, so sharing it across tasks only needs an `Arc`.
#[derive(Clone)]
pub struct PgAdapter {
    client: Arc<tokio_postgres::Client>,
}

impl PgAdapter {
    pub async fn connect(uri: &str) -> Result<Self, SqlError> {
        let config: Config = uri
            .parse()
            .map_err(|e| SqlError::Other(format!("invalid postgres uri: {e}")))?;

        let (client, connection) = config
            .connect(NoTls)
            .await
            .map_err(|e| SqlError::Database(e.to_string()))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "postgres connection task ended");
            }
        });

        Ok(PgAdapter { client: Arc::new(client) })
    }

    pub async fn exec(&self, sql: &str) -> Result<u64, SqlError> {
        self.client.execute(sql, &[]).await.map_err(classify_exec_error)
    }

    pub async fn exec_params(&self, sql: &str, values: &[Value]) -> Result<u64, SqlError> {
        let store = PgParamStore::new(values);
        self.client
            .execute(sql, &store.as_sql_slice())
            .await
            .map_err(classify_exec_error)
    }

    pub async fn truncate_table(&self, table: &str) -> Result<(), SqlError> {
        self.exec(&format!("TRUNCATE TABLE {table}")).await?;
        Ok(())
    }

    /// Streams `rows` into `table` via `COPY ... FROM STDIN WITH (FORMAT
    /// csv)`, one CSV line per row. A COPY failure aborts the whole batch
    /// and is surfaced as a structured error so the bulk writer falls
    /// back to per-row upserts (§4.2).
    pub async fn copy_rows(
        &self,
        table: &str,
        columns: &[String],
        rows: &[Vec<Value>],
    ) -> Result<u64, SqlError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let column_list = columns.join(", ");
        let sql = format!("COPY {table} ({column_list}) FROM STDIN WITH (FORMAT csv)");

        let sink = self
            .client
            .copy_in::<bytes::Bytes>(&sql)
            .await
            .map_err(|e| SqlError::Structured(e.to_string()))?;
        tokio::pin!(sink);

        for row in rows {
            let mut line = encode_copy_line(row);
            line.push('\n');
            sink.send(bytes::Bytes::from(line.into_bytes()))
                .await
                .map_err(|e| SqlError::Structured(e.to_string()))?;
        }

        sink.close().await.map_err(|e| SqlError::Structured(e.to_string()))?;
        Ok(rows.len() as u64)
    }
}

/// Classifies an `execute` failure: anything carrying a server-side
/// SQLSTATE is "structured" (eligible for the exception shield's per-row
/// suppression under `--unsafe`); anything else (a lost connection, a
/// protocol error) is a plain database error the retry harness should
/// treat as transient.
fn classify_exec_error(err: tokio_postgres::Error) -> SqlError {
    if err.code().is_some() {
        warn!(error = %err, "structured postgres error");
        SqlError::Structured(err.to_string())
    } else {
        SqlError::Database(err.to_string())
    }
}
