use tokio_util::sync::CancellationToken;

/// Process-local cooperative cancellation token (§9 "Global mutability").
///
/// The reference implementation uses a process-wide stop flag and
/// `exit(0)` to honor it mid-import; here it is a field explicitly passed
/// down, polled at every suspension point named in §5, and on trip the
/// importer/tail loop return cleanly instead of terminating the process.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(CancellationToken);

impl StopFlag {
    pub fn new() -> Self {
        StopFlag(CancellationToken::new())
    }

    pub fn trip(&self) {
        self.0.cancel();
    }

    pub fn is_tripped(&self) -> bool {
        self.0.is_cancelled()
    }

    pub fn token(&self) -> CancellationToken {
        self.0.clone()
    }
}
