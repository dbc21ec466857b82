use bigdecimal::{BigDecimal, FromPrimitive};
use bson::Bson;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A single scalar destined for one target column.
///
/// This is the row-tuple element type: the transform's output, and the
/// value half of the column-name map the exception shield logs and the
/// bulk writer COPYs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Decimal(BigDecimal),
    String(String),
    Boolean(bool),
    Json(serde_json::Value),
    Uuid(Uuid),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    TimestampNaive(NaiveDateTime),
    Array(Vec<Value>),
    Null,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v}"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Json(v) => write!(f, "{v}"),
            Value::Uuid(v) => write!(f, "{v}"),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Value::Date(v) => write!(f, "{v}"),
            Value::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
            Value::TimestampNaive(v) => write!(f, "{v}"),
            Value::Array(v) => write!(f, "{v:?}"),
            Value::Null => write!(f, "NULL"),
        }
    }
}

/// Converts one BSON value from an oplog/document field into a `Value`.
///
/// This is the single point where the schemaless source document meets
/// the typed row tuple; the schema spec's `transform` calls this per field.
pub fn from_bson(b: &Bson) -> Value {
    match b {
        Bson::Double(v) => Value::Float(*v),
        Bson::String(v) => Value::String(v.clone()),
        Bson::Array(items) => Value::Array(items.iter().map(from_bson).collect()),
        Bson::Document(doc) => Value::Json(bson::Bson::Document(doc.clone()).into()),
        Bson::Boolean(v) => Value::Boolean(*v),
        Bson::Null => Value::Null,
        Bson::RegularExpression(_) => Value::Null,
        Bson::JavaScriptCode(code) => Value::String(code.clone()),
        Bson::Int32(v) => Value::Int(*v as i64),
        Bson::Int64(v) => Value::Int(*v),
        Bson::Timestamp(ts) => Value::Int(((ts.time as i64) << 32) | ts.increment as i64),
        Bson::Binary(bin) => Value::Bytes(bin.bytes.clone()),
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => Value::Timestamp(dt.to_chrono()),
        Bson::Decimal128(dec) => BigDecimal::from_str_radix(&dec.to_string(), 10)
            .map(Value::Decimal)
            .unwrap_or(Value::String(dec.to_string())),
        Bson::Undefined => Value::Null,
        Bson::MaxKey | Bson::MinKey => Value::Null,
        Bson::Symbol(v) => Value::String(v.clone()),
        Bson::JavaScriptCodeWithScope(code) => Value::String(code.code.clone()),
        Bson::DbPointer(_) => Value::Null,
    }
}

trait FromStrRadixExt {
    fn from_str_radix(s: &str, radix: u32) -> Result<BigDecimal, ()>;
}

impl FromStrRadixExt for BigDecimal {
    fn from_str_radix(s: &str, _radix: u32) -> Result<BigDecimal, ()> {
        use std::str::FromStr;
        BigDecimal::from_str(s).map_err(|_| ())
    }
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v) => Some(*v as i64),
            Value::Decimal(v) => bigdecimal::ToPrimitive::to_i64(v),
            Value::String(s) => s.parse().ok(),
            Value::Boolean(v) => Some(if *v { 1 } else { 0 }),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

#[allow(unused)]
fn decimal_from_float(f: f64) -> Option<BigDecimal> {
    BigDecimal::from_f64(f)
}
