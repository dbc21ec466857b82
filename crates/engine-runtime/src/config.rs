use std::path::PathBuf;

/// Every option spec.md §6 names, plus the ambient connection settings a
/// runnable crate needs that the core itself treats as out of scope (§1).
#[derive(Debug, Clone)]
pub struct Config {
    /// Mongo-compatible connection string for the source.
    pub source_uri: String,
    /// Postgres connection string for the target.
    pub target_uri: String,
    /// Path to the YAML schema spec (§3).
    pub schema_path: PathBuf,
    /// Path to the sled database backing the tailer's resume timestamp.
    pub tailer_path: PathBuf,

    /// Force the importer to run even if a resume timestamp exists.
    pub reimport: bool,
    /// Run the importer only; do not touch the tailer's timestamp.
    pub skip_tail: bool,
    /// Neither drop during `create_schema` nor truncate before import.
    pub no_drop_tables: bool,
    /// Seconds-since-epoch override for the resume timestamp on `optail`.
    pub tail_from: Option<u32>,
    /// Drop delete ops silently.
    pub ignore_delete: bool,
    /// Under PostgreSQL, suppress per-row errors that carry a structured
    /// result.
    pub unsafe_mode: bool,
}

impl Config {
    pub fn new(source_uri: String, target_uri: String, schema_path: PathBuf, tailer_path: PathBuf) -> Self {
        Config {
            source_uri,
            target_uri,
            schema_path,
            tailer_path,
            reimport: false,
            skip_tail: false,
            no_drop_tables: false,
            tail_from: None,
            ignore_delete: false,
            unsafe_mode: false,
        }
    }
}
