use model::value::Value;

/// Escapes a string for inclusion as one CSV field in a `COPY ... WITH
/// (FORMAT csv)` stream: doubles embedded quotes, wraps the field in
/// quotes whenever it contains a quote, comma, or newline.
pub fn escape_csv_string(s: &str) -> String {
    if s.contains(['"', ',', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Encodes binary data as a Postgres `bytea` hex literal suitable for a
/// CSV field (`\x`-prefixed hex, itself never needing CSV quoting).
pub fn encode_bytea(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("\\x");
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

/// Renders one `Value` as a single CSV field for the bulk-copy line.
pub fn encode_copy_field(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Int(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Decimal(v) => v.to_string(),
        Value::Boolean(v) => v.to_string(),
        Value::String(v) => escape_csv_string(v),
        Value::Json(v) => escape_csv_string(&v.to_string()),
        Value::Uuid(v) => v.to_string(),
        Value::Bytes(v) => encode_bytea(v),
        Value::Date(v) => v.to_string(),
        Value::Timestamp(v) => v.to_rfc3339(),
        Value::TimestampNaive(v) => v.to_string(),
        Value::Array(items) => escape_csv_string(
            &items
                .iter()
                .map(encode_copy_field)
                .collect::<Vec<_>>()
                .join(";"),
        ),
    }
}

/// Encodes one row tuple as a single CSV line (no trailing newline), in
/// the order `columns` names them.
pub fn encode_copy_line(values: &[Value]) -> String {
    values
        .iter()
        .map(encode_copy_field)
        .collect::<Vec<_>>()
        .join(",")
}
