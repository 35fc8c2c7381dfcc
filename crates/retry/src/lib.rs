//! Bounded retry orchestration for network operations.
//!
//! ## Design
//!
//! - Every attempt races the operation against a per-attempt timeout
//! - Failed attempts are retried after a fixed delay, up to a bound
//! - Progress and terminal failure are reported to an injected sink
//! - Exhaustion is reported through state and a `None` result, never an error
//! - Execution state is owned per call, never shared between executions
//!
//! ## Components
//!
//! - `RetryPolicy`: attempt bound, attempt timeout, retry delay
//! - `RetryExecutor`: runs operations under the policy
//! - `ExecutionTracker`: observable loading/error state of one call site
//! - `NotificationSink`: where retry/failure messages go

pub mod config;
pub mod error;
pub mod executor;
pub mod notify;
pub mod policy;
pub mod state;

pub use config::RetryPolicyConfig;
pub use error::{AttemptError, ConfigError, ErrorKind, FALLBACK_MESSAGE};
pub use executor::RetryExecutor;
pub use notify::{
    NoopSink, Notification, NotificationLevel, NotificationSink, RecordingSink, TracingSink,
};
pub use policy::RetryPolicy;
pub use state::{Execution, ExecutionState, ExecutionTracker};
