use model::contracts::SourceError;
use mongodb::error::ErrorKind;

/// Classifies a raw driver error at the boundary, the single point named
/// in the Design Notes ("classify once at the driver boundary").
///
/// Duplicate-key (codes 11000/11001) and cursor-invalidation errors are
/// fatal-now per §4.1; everything else from the driver is treated as a
/// transient connection/operation failure.
pub fn classify_mongo_driver_error(err: &mongodb::error::Error) -> SourceError {
    let message = err.to_string();

    if message.starts_with(SourceError::CURSOR_NOT_FOUND_PREFIX) {
        return SourceError::CursorInvalidated(message);
    }

    match err.kind.as_ref() {
        ErrorKind::Command(cmd_err) => match cmd_err.code {
            11000 | 11001 => SourceError::DuplicateKey { code: cmd_err.code as u32 },
            43 => SourceError::CursorInvalidated(message),
            _ => SourceError::Operation(message),
        },
        ErrorKind::Write(mongodb::error::WriteFailure::WriteError(write_err))
            if write_err.code == 11000 || write_err.code == 11001 =>
        {
            SourceError::DuplicateKey { code: write_err.code as u32 }
        }
        ErrorKind::Io(_) | ErrorKind::ServerSelection { .. } | ErrorKind::ConnectionPoolCleared { .. } => {
            SourceError::Connection(message)
        }
        _ => SourceError::Operation(message),
    }
}
