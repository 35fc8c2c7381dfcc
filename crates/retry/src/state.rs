//! Observable execution state.
//!
//! Each execution owns its state: either through a caller-held
//! [`ExecutionTracker`] borrowed mutably for the whole call, or through a
//! fresh tracker whose final snapshot is returned in [`Execution`]. Two
//! executions can therefore never write into the same state concurrently.

use serde::Serialize;
use tokio::sync::watch;

/// Snapshot of one execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionState {
    /// True while the operation or a retry delay is in flight.
    pub is_loading: bool,
    /// Set only when every attempt failed.
    pub last_error: Option<String>,
    /// Failed attempts so far.
    pub attempt_count: u32,
}

/// Owner of the observable state of one call site (a page, a form).
///
/// UI code subscribes to it and re-renders on change; the executor is the
/// only writer.
#[derive(Debug)]
pub struct ExecutionTracker {
    tx: watch::Sender<ExecutionState>,
}

impl Default for ExecutionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionTracker {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ExecutionState::default());
        Self { tx }
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<ExecutionState> {
        self.tx.subscribe()
    }

    /// Current state.
    pub fn snapshot(&self) -> ExecutionState {
        self.tx.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.tx.borrow().is_loading
    }

    pub fn last_error(&self) -> Option<String> {
        self.tx.borrow().last_error.clone()
    }

    pub fn attempt_count(&self) -> u32 {
        self.tx.borrow().attempt_count
    }

    pub(crate) fn begin(&mut self) {
        self.tx.send_replace(ExecutionState {
            is_loading: true,
            last_error: None,
            attempt_count: 0,
        });
    }

    /// Count a failed attempt; returns the new count.
    pub(crate) fn record_failure(&mut self) -> u32 {
        let mut count = 0;
        self.tx.send_modify(|state| {
            state.attempt_count += 1;
            count = state.attempt_count;
        });
        count
    }

    pub(crate) fn succeed(&mut self) {
        self.tx.send_modify(|state| state.is_loading = false);
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.tx.send_modify(|state| {
            state.last_error = Some(message);
            state.is_loading = false;
        });
    }
}

/// Result of an execution together with its final state.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution<T> {
    pub result: Option<T>,
    pub state: ExecutionState,
}

impl<T> Execution<T> {
    pub fn is_success(&self) -> bool {
        self.result.is_some()
    }

    /// Success value, or the terminal error message.
    pub fn into_result(self) -> Result<T, String> {
        match self.result {
            Some(value) => Ok(value),
            None => Err(self
                .state
                .last_error
                .unwrap_or_else(|| crate::error::FALLBACK_MESSAGE.to_string())),
        }
    }
}
