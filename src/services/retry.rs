use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Bounded retry configuration shared by the balance fetch and every
/// notification channel.
///
/// One initial attempt is made, followed by at most `retry_count` retries.
/// `retry_delay` is slept before each retry, never before the first attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retry_count: u32,
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_count: 3,                        // 4 attempts in total
            retry_delay: Duration::from_secs(60), // 1 minute
        }
    }
}

impl RetryPolicy {
    pub fn new(retry_count: u32, retry_delay: Duration) -> Self {
        Self {
            retry_count,
            retry_delay,
        }
    }

    /// Total number of attempts including the first one
    pub fn total_attempts(&self) -> u32 {
        self.retry_count.saturating_add(1)
    }

    /// Check if another attempt is allowed after `attempts` have been made
    pub fn should_retry(&self, attempts: u32) -> bool {
        attempts < self.total_attempts()
    }

    /// Run `op` until it succeeds or the attempt budget is spent.
    ///
    /// `op` receives the zero-based attempt index and decides success itself:
    /// whatever it maps to `Ok` ends the loop. Only the most recent error is
    /// kept when every attempt fails.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let mut attempt: u32 = 0;

        loop {
            if attempt > 0 {
                tracing::info!(
                    "Retrying {} in {:?}... (Attempt {}/{})",
                    label,
                    self.retry_delay,
                    attempt,
                    self.retry_count
                );
                tokio::time::sleep(self.retry_delay).await;
            }

            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    attempt += 1;
                    tracing::warn!(
                        attempt,
                        max_attempts = self.total_attempts(),
                        "{} failed: {}",
                        label,
                        e
                    );

                    if !self.should_retry(attempt) {
                        return Err(RetryError {
                            attempts: attempt,
                            last_error: e,
                        });
                    }
                }
            }
        }
    }
}

/// Outcome of an exhausted retry sequence. Earlier errors are dropped.
#[derive(Debug)]
pub struct RetryError<E> {
    pub attempts: u32,
    pub last_error: E,
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (after {} attempts)", self.last_error, self.attempts)
    }
}

impl<E> std::error::Error for RetryError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.last_error)
    }
}
