use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Indicates whether an error should be retried or treated as fatal (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    Retry,
    Stop,
}

/// Result of running an operation under the retry policy.
///
/// Per the Open Questions in §9, this makes the "best effort" policy
/// explicit rather than silently returning a default: callers decide
/// whether attempts-exhausted is acceptable to ignore.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The error was considered fatal and should bubble up immediately.
    Fatal(E),
    /// The error was retryable, but the configured attempts were exhausted.
    AttemptsExceeded(E),
}

/// Bounded exponential-backoff retry over source-driver failures (C1).
///
/// Delay after attempt `n` (0-indexed) is `base * multiplier^n`, capped at
/// `max_delay`. The reference policy is `max_attempts = 10`,
/// `base_delay = 500ms`, `multiplier = 1.5`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::reference()
    }
}

impl RetryPolicy {
    /// The policy named in §4.1: 10 attempts, `0.5 * 1.5^attempt` seconds.
    pub fn reference() -> Self {
        Self {
            max_attempts: 10,
            base_delay: Duration::from_millis(500),
            multiplier: 1.5,
            max_delay: Duration::from_secs(60),
        }
    }

    pub fn new(max_attempts: usize, base_delay: Duration, multiplier: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            multiplier,
            max_delay: Duration::from_secs(60),
        }
    }

    /// Executes `op` under this policy, classifying each failure with
    /// `classify`. Transient failures sleep and retry; fatal failures
    /// return immediately as `RetryError::Fatal`.
    pub async fn run<F, Fut, T, E, Classifier>(
        &self,
        mut op: F,
        classify: Classifier,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        Classifier: Fn(&E) -> RetryDisposition,
        E: std::fmt::Display,
    {
        let mut attempt = 0usize;

        loop {
            match op().await {
                Ok(result) => return Ok(result),
                Err(err) => match classify(&err) {
                    RetryDisposition::Stop => return Err(RetryError::Fatal(err)),
                    RetryDisposition::Retry => {
                        if attempt + 1 >= self.max_attempts {
                            return Err(RetryError::AttemptsExceeded(err));
                        }

                        let delay = self.backoff_delay(attempt);
                        warn!(
                            attempt = attempt + 1,
                            max_attempts = self.max_attempts,
                            delay_ms = delay.as_millis(),
                            error = %err,
                            "transient failure, retrying"
                        );
                        sleep(delay).await;
                        attempt += 1;
                    }
                },
            }
        }
    }

    /// Runs `op` under this policy and treats attempts-exhausted as
    /// best-effort: logs and returns `None` instead of surfacing an error
    /// (the reference harness's behavior, made explicit per §9).
    pub async fn run_best_effort<F, Fut, T, E, Classifier>(
        &self,
        op: F,
        classify: Classifier,
    ) -> Result<Option<T>, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        Classifier: Fn(&E) -> RetryDisposition,
        E: std::fmt::Display,
    {
        match self.run(op, classify).await {
            Ok(result) => Ok(Some(result)),
            Err(RetryError::Fatal(err)) => Err(err),
            Err(RetryError::AttemptsExceeded(err)) => {
                warn!(error = %err, "retry attempts exhausted, giving up silently");
                Ok(None)
            }
        }
    }

    fn backoff_delay(&self, attempt: usize) -> Duration {
        let factor = self.multiplier.powi(attempt as i32);
        let delay_secs = self.base_delay.as_secs_f64() * factor;
        let capped = delay_secs.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped.max(0.0))
    }
}
