//! Bounded retry with a fixed pause between attempts.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::price::PriceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Zero is treated as one.
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(attempts: u32, backoff: Duration) -> Self {
        Self { attempts, backoff }
    }

    /// Runs `op` until it succeeds, fails permanently, or attempts run out.
    ///
    /// # Errors
    ///
    /// Returns the last error once no attempt is left or the error is not
    /// retryable.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, PriceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, PriceError>>,
    {
        let max = self.attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < max && e.is_retryable() => {
                    warn!(
                        what,
                        attempt,
                        max_attempts = max,
                        error = %e,
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(self.backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
