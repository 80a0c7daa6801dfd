//! Bounded retry with exponential backoff for store operations.

use super::StoreError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Delays slept between attempts. `delays.len() + 1` attempts are made in total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub delays: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delays: vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
            ],
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no sleeping.
    pub fn none() -> Self {
        Self { delays: Vec::new() }
    }

    pub fn max_attempts(&self) -> u32 {
        self.delays.len() as u32 + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Read,
    Write,
}

impl OpKind {
    fn exhausted(self, operation: &'static str, attempts: u32, cause: StoreError) -> StoreError {
        let cause = Box::new(cause);
        match self {
            OpKind::Read => StoreError::DatabaseRead {
                operation,
                attempts,
                cause,
            },
            OpKind::Write => StoreError::DatabaseWrite {
                operation,
                attempts,
                cause,
            },
        }
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the policy runs out.
///
/// Exhaustion is reported as `DatabaseRead`/`DatabaseWrite` wrapping the last cause.
pub async fn with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    kind: OpKind,
    operation: &'static str,
    mut op: F,
) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        let err = match op().await {
            Ok(v) => return Ok(v),
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) => e,
        };

        let Some(delay) = policy.delays.get(attempt as usize - 1).copied() else {
            tracing::error!(
                operation,
                attempts = attempt,
                error = %err,
                "store operation failed, giving up"
            );
            return Err(kind.exhausted(operation, attempt, err));
        };

        tracing::warn!(
            operation,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "store operation failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn validation_errors_return_without_sleeping() {
        let calls = AtomicU32::new(0);
        let start = tokio::time::Instant::now();
        let res: Result<(), _> =
            with_backoff(&RetryPolicy::default(), OpKind::Write, "save", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(StoreError::Validation("score out of range".into())) }
            })
            .await;
        assert!(matches!(res, Err(StoreError::Validation(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn none_policy_makes_a_single_attempt() {
        let calls = AtomicU32::new(0);
        let res: Result<(), _> = with_backoff(&RetryPolicy::none(), OpKind::Read, "get", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(StoreError::Poisoned) }
        })
        .await;
        assert!(matches!(
            res,
            Err(StoreError::DatabaseRead { attempts: 1, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
