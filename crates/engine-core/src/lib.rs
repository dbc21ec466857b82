pub mod metrics;
pub mod retry;
pub mod stop;
pub mod truncation;

pub use metrics::ImportMetrics;
pub use retry::{RetryDisposition, RetryError, RetryPolicy};
pub use stop::StopFlag;
pub use truncation::TruncationMemo;
