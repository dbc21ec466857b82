use model::contracts::{SourceError, SqlError, TailerError};
use thiserror::Error;

/// Failure points inside the importer (C4): source scan, bulk/per-row
/// write, and the retry harness giving up for good.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("write error: {0}")]
    Write(#[from] WriteError),

    #[error("tailer error: {0}")]
    Tailer(#[from] TailerError),
}

/// Failure points inside the tail loop (C6) and the op interpreter (C5).
#[derive(Debug, Error)]
pub enum TailError {
    #[error("tailer error: {0}")]
    Tailer(#[from] TailerError),

    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("write error: {0}")]
    Write(#[from] WriteError),
}

/// A write that escaped the exception shield: either a bulk write's
/// fallback path also failed, or a per-row error was not eligible for
/// suppression (§4.3/§4.2).
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("sql error: {0}")]
    Sql(#[from] SqlError),
}
