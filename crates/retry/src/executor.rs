//! Retry executor: timeout race, bounded retries, notifications.

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error, warn};

use crate::error::AttemptError;
use crate::notify::{Notification, NotificationSink, TracingSink};
use crate::policy::RetryPolicy;
use crate::state::{Execution, ExecutionTracker};

/// Runs asynchronous operations under a [`RetryPolicy`].
///
/// Each attempt spawns the operation's future as a Tokio task and races it
/// against the attempt timeout. On timeout the task is detached, not aborted:
/// it may still finish later, and its side effects stand.
///
/// Failures never escape: an execution ends either with the operation's value
/// or with `None` after the terminal error has been recorded and announced.
/// Every failure kind is retried alike.
#[derive(Debug, Clone)]
pub struct RetryExecutor<N = TracingSink> {
    policy: RetryPolicy,
    sink: N,
}

impl Default for RetryExecutor<TracingSink> {
    fn default() -> Self {
        Self::new(RetryPolicy::default(), TracingSink)
    }
}

impl<N: NotificationSink> RetryExecutor<N> {
    pub fn new(policy: RetryPolicy, sink: N) -> Self {
        Self { policy, sink }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn sink(&self) -> &N {
        &self.sink
    }

    /// Run `operation` with a fresh, call-owned state.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Execution<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Into<AttemptError> + Send + 'static,
    {
        let mut tracker = ExecutionTracker::new();
        let result = self.execute_with_retry(&mut tracker, operation).await;
        Execution {
            result,
            state: tracker.snapshot(),
        }
    }

    /// Run `operation` until it succeeds or the attempt bound is reached.
    ///
    /// `tracker` is reset at the start and reflects loading, failure count,
    /// and terminal error while the call runs. `operation` is invoked afresh
    /// for every attempt.
    pub async fn execute_with_retry<F, Fut, T, E>(
        &self,
        tracker: &mut ExecutionTracker,
        mut operation: F,
    ) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Into<AttemptError> + Send + 'static,
    {
        let max_attempts = self.policy.max_attempts();
        tracker.begin();

        loop {
            let attempt = tracker.attempt_count() + 1;
            // A panic while building the future fails the attempt like one inside it.
            let outcome = match panic::catch_unwind(AssertUnwindSafe(&mut operation)) {
                Ok(fut) => self.run_attempt(fut).await,
                Err(_) => Err(AttemptError::Panicked),
            };
            let err = match outcome {
                Ok(value) => {
                    debug!(attempt, max_attempts, "operation succeeded");
                    tracker.succeed();
                    return Some(value);
                }
                Err(err) => err,
            };

            let failed = tracker.record_failure();
            let message = err.message();

            if !self.policy.should_retry(failed) {
                error!(
                    attempts = failed,
                    kind = ?err.kind(),
                    error = %message,
                    "operation failed, attempts exhausted"
                );
                self.sink
                    .notify(Notification::exhausted(max_attempts, &message));
                tracker.fail(message);
                return None;
            }

            warn!(
                attempt,
                max_attempts,
                kind = ?err.kind(),
                error = %message,
                delay_ms = self.policy.retry_delay().as_millis() as u64,
                "attempt failed, retrying"
            );
            self.sink
                .notify(Notification::retrying(failed + 1, max_attempts));
            tokio::time::sleep(self.policy.retry_delay()).await;
        }
    }

    async fn run_attempt<Fut, T, E>(&self, fut: Fut) -> Result<T, AttemptError>
    where
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Into<AttemptError> + Send + 'static,
    {
        let task = tokio::spawn(fut);
        match tokio::time::timeout(self.policy.attempt_timeout(), task).await {
            // Dropping the JoinHandle detaches the task; it keeps running.
            Err(_elapsed) => Err(AttemptError::Timeout),
            Ok(Err(join_err)) => Err(AttemptError::from_join(join_err)),
            Ok(Ok(outcome)) => outcome.map_err(Into::into),
        }
    }
}
