//! Caller-side retry around fetches
//!
//! [`crate::fetch::Fetcher`] performs exactly one request per call. Workflows
//! that want another attempt on flaky portals wrap it here.

use crate::fetch::Fetcher;
use crate::{Page, Result};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub attempts: u32,
    /// Pause between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 1,
            delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// `retries` extra attempts after the first
    pub fn with_retries(retries: u32) -> Self {
        Self {
            attempts: retries.saturating_add(1),
            ..Default::default()
        }
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts && e.is_transient() => {
                    warn!("Attempt {}/{} failed: {}", attempt, attempts, e);
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Fetch `url`, retrying transient failures per `policy`
pub async fn fetch_with_retry(fetcher: &Fetcher, url: &str, policy: &RetryPolicy) -> Result<Page> {
    policy.run(move || fetcher.fetch(url)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LipiError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn transient() -> LipiError {
        LipiError::StatusError {
            url: "https://example.org/".into(),
            status: 503,
            reason: Some("Service Unavailable"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_errors_until_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = RetryPolicy::with_retries(2);

        let result = policy
            .run(move || async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(transient())
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_attempts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = RetryPolicy::with_retries(1);

        let result: Result<()> = policy
            .run(move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(transient())
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = RetryPolicy::with_retries(5);

        let result: Result<()> = policy
            .run(move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(LipiError::ConfigError("bad".into()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
