//! HTTP transport for the external embedding and generation services.
//!
//! The core's `Embedder` and `Generator` contracts forbid internal retries;
//! this layer is where retry, backoff, and per-attempt timeouts live.
//!
//! # Retry Strategy
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - Timeouts and connection errors → retry
//! - Other HTTP 4xx and malformed bodies → fail immediately
//! - Backoff: `base`, `2×base`, `4×base`, … capped at `32×base`
//!
//! Every wait is an `.await`, so dropping the caller's future cancels the
//! in-flight request or backoff sleep.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{service} request timed out after {after:?}")]
    Timeout {
        service: &'static str,
        after: Duration,
    },

    #[error("{service} API error {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} connection error: {source}")]
    Connection {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned a malformed response: {detail}")]
    Malformed {
        service: &'static str,
        detail: String,
    },
}

impl TransportError {
    pub fn malformed(service: &'static str, detail: impl Into<String>) -> Self {
        TransportError::Malformed {
            service,
            detail: detail.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Timeout { .. } | TransportError::Connection { .. } => true,
            TransportError::Status { status, .. } => *status == 429 || *status >= 500,
            TransportError::Malformed { .. } => false,
        }
    }
}

/// Bounded exponential backoff with a timeout on every attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, attempt_timeout: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay: base_delay.saturating_mul(32),
            attempt_timeout,
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32 << retry.saturating_sub(1).min(5);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// retry budget is spent. The last error is returned.
    pub async fn run<T, F, Fut>(
        &self,
        service: &'static str,
        mut op: F,
    ) -> Result<T, TransportError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let mut retry = 0;
        loop {
            if retry > 0 {
                let delay = self.delay_for(retry);
                debug!(service, retry, ?delay, "backing off");
                tokio::time::sleep(delay).await;
            }

            let result = match tokio::time::timeout(self.attempt_timeout, op()).await {
                Ok(result) => result,
                Err(_) => Err(TransportError::Timeout {
                    service,
                    after: self.attempt_timeout,
                }),
            };

            match result {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && retry < self.max_retries => {
                    warn!(service, retry, error = %err, "transient failure, retrying");
                    retry += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Build a client whose own timeout backs up the per-attempt timeout.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// Send a request and decode a successful JSON body.
pub async fn send_json(
    service: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<Value, TransportError> {
    let response = request
        .send()
        .await
        .map_err(|source| TransportError::Connection { service, source })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(TransportError::Status {
            service,
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| TransportError::malformed(service, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::from_millis(1), Duration::from_secs(5))
    }

    fn server_error() -> TransportError {
        TransportError::Status {
            service: "test",
            status: 503,
            body: String::new(),
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::new(10, Duration::from_secs(1), Duration::from_secs(30));
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(4), Duration::from_secs(8));
        assert_eq!(policy.delay_for(6), Duration::from_secs(32));
        assert_eq!(policy.delay_for(9), Duration::from_secs(32));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(server_error().is_retryable());
        assert!(TransportError::Status {
            service: "test",
            status: 429,
            body: String::new()
        }
        .is_retryable());
        assert!(!TransportError::Status {
            service: "test",
            status: 400,
            body: String::new()
        }
        .is_retryable());
        assert!(!TransportError::malformed("test", "no data").is_retryable());
        assert!(TransportError::Timeout {
            service: "test",
            after: Duration::from_secs(1)
        }
        .is_retryable());
    }

    #[tokio::test]
    async fn test_run_retries_transient_errors() {
        let counter = AtomicU32::new(0);
        let attempts = &counter;
        let result = fast_policy(2)
            .run("test", move || async move {
                if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(server_error())
                } else {
                    Ok("done")
                }
            })
            .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_run_gives_up_after_budget() {
        let counter = AtomicU32::new(0);
        let attempts = &counter;
        let result: Result<(), _> = fast_policy(1)
            .run("test", move || async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(server_error())
            })
            .await;
        assert!(matches!(result, Err(TransportError::Status { status: 503, .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_run_does_not_retry_client_errors() {
        let counter = AtomicU32::new(0);
        let attempts = &counter;
        let result: Result<(), _> = fast_policy(3)
            .run("test", move || async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(TransportError::malformed("test", "missing embedding"))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_times_out_each_attempt() {
        let policy = RetryPolicy::new(1, Duration::from_millis(1), Duration::from_millis(20));
        let counter = AtomicU32::new(0);
        let attempts = &counter;
        let result: Result<(), _> = policy
            .run("test", move || async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                std::future::pending::<()>().await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(TransportError::Timeout { .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
