use engine_runtime::RuntimeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("replication engine error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("shutdown requested")]
    ShutdownRequested,
}
