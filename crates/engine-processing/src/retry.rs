use engine_core::RetryDisposition;
use model::contracts::SourceError;

/// Classifies a source-driver error at the one point the Design Notes
/// name ("classify once at the driver boundary"): generic connection and
/// operation failures are transient; duplicate keys and cursor
/// invalidation cannot be improved by waiting (§4.1).
pub fn classify_source_error(err: &SourceError) -> RetryDisposition {
    match err {
        SourceError::Connection(_) | SourceError::Operation(_) => RetryDisposition::Retry,
        SourceError::DuplicateKey { .. } | SourceError::CursorInvalidated(_) => {
            RetryDisposition::Stop
        }
        SourceError::Other(_) => RetryDisposition::Stop,
    }
}
