use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::config::{RETRY_BACKOFF_MS, RETRY_MAX_ATTEMPTS};
use crate::error::GatewayError;

/// Bounded retry for Gateway writes. Only transient errors are retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay before retry N is `backoff_ms[N-1]`; the last entry repeats.
    pub backoff_ms: Vec<u64>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: RETRY_MAX_ATTEMPTS,
            backoff_ms: RETRY_BACKOFF_MS.to_vec(),
        }
    }
}

impl RetryPolicy {
    /// Same attempt budget, no sleeping.
    #[cfg(test)]
    pub fn immediate() -> Self {
        Self {
            backoff_ms: vec![0],
            ..Self::default()
        }
    }

    fn delay_for(&self, retry: u32) -> Duration {
        let idx = (retry.saturating_sub(1) as usize).min(self.backoff_ms.len().saturating_sub(1));
        Duration::from_millis(self.backoff_ms.get(idx).copied().unwrap_or(0))
    }

    /// Run `op` until it succeeds, fails permanently, or the attempt cap is hit.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, GatewayError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        event = "RETRY",
                        op = label,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "RETRY | {label} | attempt {attempt}/{max_attempts} failed: {e} | next in {}ms",
                        delay.as_millis(),
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
