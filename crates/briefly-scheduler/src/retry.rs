use std::future::Future;
use std::time::Duration;

use briefly_core::error::BrieflyError;

use crate::queue::Queue;

/// Celery-style bounded retry: `max_retries` attempts, linear backoff off
/// `base_delay`, and a hard time limit per attempt (spec §4.7:
/// `task_time_limit=600`, `task_max_retries=3`, `task_default_retry_delay=60`).
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub hard_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(60),
            hard_timeout: Duration::from_secs(600),
        }
    }
}

/// Runs `f` under `policy`, retrying stage-fatal errors (spec §7 kinds
/// `Database`/`TransientExternal`) and hard-timeout overruns. Non-fatal
/// errors propagate immediately — they're expected to have already been
/// absorbed per-item inside the stage.
pub async fn run_with_retry<T, F, Fut>(
    queue: Queue,
    policy: RetryPolicy,
    mut f: F,
) -> Result<T, BrieflyError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BrieflyError>>,
{
    let mut attempt = 0u32;
    loop {
        match tokio::time::timeout(policy.hard_timeout, f()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) => {
                if attempt < policy.max_retries && err.is_stage_fatal() {
                    attempt += 1;
                    let delay = policy.base_delay * attempt;
                    tracing::warn!(
                        queue = queue.as_str(),
                        attempt,
                        delay_secs = delay.as_secs(),
                        error = %err,
                        "stage tick failed, retrying with backoff"
                    );
                    tokio::time::sleep(delay).await;
                } else {
                    return Err(err);
                }
            }
            Err(_elapsed) => {
                if attempt < policy.max_retries {
                    attempt += 1;
                    tracing::warn!(queue = queue.as_str(), attempt, "stage tick hit hard time limit, retrying");
                } else {
                    return Err(BrieflyError::TransientExternal(format!(
                        "{} tick exceeded hard time limit after {} retries",
                        queue.as_str(),
                        policy.max_retries
                    )));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn retries_transient_errors_up_to_the_limit() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(1),
            hard_timeout: Duration::from_secs(5),
        };
        let calls_clone = calls.clone();
        let result: Result<(), BrieflyError> = run_with_retry(Queue::Extract, policy, move || {
            let calls = calls_clone.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(BrieflyError::TransientExternal("boom".into()))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn succeeds_without_retrying_on_first_try() {
        let policy = RetryPolicy::default();
        let result = run_with_retry(Queue::Score, policy, || async { Ok::<_, BrieflyError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn does_not_retry_non_fatal_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();
        let result: Result<(), BrieflyError> =
            run_with_retry(Queue::Score, RetryPolicy::default(), move || {
                let calls = calls_clone.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(BrieflyError::NotFound("missing".into()))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
