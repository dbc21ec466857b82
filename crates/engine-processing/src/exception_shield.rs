use crate::error::WriteError;
use model::{
    contracts::{AdapterKind, SqlError},
    namespace::Namespace,
    value::Value,
};
use std::collections::BTreeMap;
use std::future::Future;
use tracing::{error, warn};

/// Wraps a single-row target write (C3). Suppresses the error only when
/// all three conditions from §4.3 hold: the target is PostgreSQL, the
/// adapter reported a structured result, and the operator opted into
/// `unsafe` mode. Everything else logs at ERROR and re-raises.
pub async fn shield<F, Fut>(
    adapter_scheme: AdapterKind,
    unsafe_mode: bool,
    ns: &Namespace,
    row: &BTreeMap<String, Value>,
    write: F,
) -> Result<(), WriteError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(), SqlError>>,
{
    match write().await {
        Ok(()) => Ok(()),
        Err(err) if adapter_scheme == AdapterKind::Postgres && err.has_structured_result() && unsafe_mode => {
            warn!(ns = %ns, row = ?row, error = %err, "skipping poisoned row under unsafe policy");
            Ok(())
        }
        Err(err) => {
            error!(ns = %ns, row = ?row, error = %err, "target write failed");
            Err(WriteError::Sql(err))
        }
    }
}
