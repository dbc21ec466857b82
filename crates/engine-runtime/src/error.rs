use engine_processing::{ImportError, TailError};
use model::contracts::{SourceError, SqlError, TailerError};
use thiserror::Error;

/// Top-level errors an orchestrator run can fail with: setup failures
/// (connecting, reading the schema file) plus whatever bubbles up from
/// C4's importer or C6's tail loop.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("source connection error: {0}")]
    Source(#[from] SourceError),

    #[error("target connection error: {0}")]
    Sql(#[from] SqlError),

    #[error("tailer error: {0}")]
    Tailer(#[from] TailerError),

    #[error("schema file error: {0}")]
    SchemaFile(#[from] std::io::Error),

    #[error("schema file is not valid yaml: {0}")]
    SchemaYaml(#[from] serde_yaml::Error),

    #[error("import failed: {0}")]
    Import(#[from] ImportError),

    #[error("tail loop failed: {0}")]
    Tail(#[from] TailError),
}
