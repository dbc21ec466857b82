use crate::postgres::encoder::encode_bytea;
use model::value::Value;
use tokio_postgres::types::ToSql;

/// Owns one bound parameter's storage so the `&(dyn ToSql + Sync)` slice
/// `tokio_postgres` needs can borrow from a value that outlives the call.
///
/// `create_schema` (schema.rs) declares every target column `TEXT`, with
/// no per-column type information to coerce against. A parameter bound as
/// its native Postgres type (`i64` -> `INT8`, `bool` -> `BOOL`, ...) fails
/// `ToSql::accepts()` client-side against a `TEXT` placeholder before the
/// query ever reaches the server, so every `PgParam` variant renders as
/// text instead, matching the column type it's actually bound against.
pub enum PgParam {
    Text(String),
    Null,
}

impl PgParam {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => PgParam::Null,
            other => PgParam::Text(render_text(other)),
        }
    }

    pub fn as_sql(&self) -> &(dyn ToSql + Sync) {
        match self {
            PgParam::Text(v) => v,
            PgParam::Null => &NULL_SENTINEL,
        }
    }
}

static NULL_SENTINEL: Option<String> = None;

/// Renders one `Value` as the text its `TEXT` column actually stores.
/// Mirrors `encoder::encode_copy_field`'s per-variant formatting, minus
/// the CSV-specific quoting a bound parameter never needs.
fn render_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Int(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Decimal(v) => v.to_string(),
        Value::String(v) => v.clone(),
        Value::Boolean(v) => v.to_string(),
        Value::Json(v) => v.to_string(),
        Value::Uuid(v) => v.to_string(),
        Value::Bytes(v) => encode_bytea(v),
        Value::Date(v) => v.to_string(),
        Value::Timestamp(v) => v.to_rfc3339(),
        Value::TimestampNaive(v) => v.to_string(),
        Value::Array(items) => items.iter().map(render_text).collect::<Vec<_>>().join(";"),
    }
}

/// Builds the borrowed parameter slice `tokio_postgres` expects, owning
/// the intermediate `PgParam`s for the duration of one call.
pub struct PgParamStore(Vec<PgParam>);

impl PgParamStore {
    pub fn new(values: &[Value]) -> Self {
        PgParamStore(values.iter().map(PgParam::from_value).collect())
    }

    pub fn as_sql_slice(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.0.iter().map(|p| p.as_sql()).collect()
    }
}
