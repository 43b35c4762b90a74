//! Caller-layer retry policy for single task attempts.
//!
//! The executor itself attempts each task exactly once; callers that want
//! retries wrap the attempt in a policy. Every attempt is billed normally,
//! so retries are visible in the ledger.

use crate::types::{TaskResult, TaskStatus};
use std::future::Future;
use std::time::Duration;

/// Fixed-pause retry policy over task attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    attempts: u32,
    pause: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 1,
            pause: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// `attempts` is the total attempt count, clamped to at least one.
    pub fn new(attempts: u32, pause: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            pause,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn pause(&self) -> Duration {
        self.pause
    }

    /// Run `attempt` until it returns `Ok` or attempts are exhausted,
    /// pausing between tries. The last result is returned either way.
    pub async fn run<F, Fut>(&self, mut attempt: F) -> TaskResult
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = TaskResult>,
    {
        let mut last = attempt().await;
        for retry in 1..self.attempts {
            if last.status == TaskStatus::Ok {
                break;
            }
            tracing::debug!(
                task_id = %last.task_id,
                capability = %last.capability,
                retry,
                "retrying failed task"
            );
            tokio::time::sleep(self.pause).await;
            last = attempt().await;
        }
        last
    }
}
