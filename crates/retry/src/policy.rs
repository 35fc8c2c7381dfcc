//! Retry policy: how many attempts, how long each may take, how long to wait.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::RetryPolicyConfig;
use crate::error::ConfigError;

/// Bounded fixed-delay retry policy.
///
/// Always holds at least one attempt and a non-zero attempt timeout. Both
/// durations are whole milliseconds, so the policy survives a round trip
/// through [`RetryPolicyConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RetryPolicyConfig", into = "RetryPolicyConfig")]
pub struct RetryPolicy {
    max_attempts: u32,
    attempt_timeout: Duration,
    retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout: Duration::from_millis(5_000),
            retry_delay: Duration::from_millis(1_000),
        }
    }
}

impl RetryPolicy {
    pub fn new(
        max_attempts: u32,
        attempt_timeout: Duration,
        retry_delay: Duration,
    ) -> Result<Self, ConfigError> {
        if max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        if attempt_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        whole_millis("attempt_timeout", attempt_timeout)?;
        whole_millis("retry_delay", retry_delay)?;
        Ok(Self {
            max_attempts,
            attempt_timeout,
            retry_delay,
        })
    }

    /// Create a policy that makes a single attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    pub fn with_max_attempts(self, max_attempts: u32) -> Result<Self, ConfigError> {
        Self::new(max_attempts, self.attempt_timeout, self.retry_delay)
    }

    pub fn with_attempt_timeout(self, attempt_timeout: Duration) -> Result<Self, ConfigError> {
        Self::new(self.max_attempts, attempt_timeout, self.retry_delay)
    }

    pub fn with_retry_delay(self, retry_delay: Duration) -> Result<Self, ConfigError> {
        Self::new(self.max_attempts, self.attempt_timeout, retry_delay)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    /// Check if another attempt is allowed after `failed` failures.
    pub fn should_retry(&self, failed: u32) -> bool {
        failed < self.max_attempts
    }

    /// Upper bound on the wall-clock time of one execution.
    pub fn worst_case(&self) -> Duration {
        (self.attempt_timeout + self.retry_delay).saturating_mul(self.max_attempts)
    }
}

fn whole_millis(field: &'static str, duration: Duration) -> Result<(), ConfigError> {
    if duration.subsec_nanos() % 1_000_000 != 0 {
        return Err(ConfigError::SubMillisecond { field, duration });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_three_attempts_five_seconds_one_second() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.attempt_timeout(), Duration::from_secs(5));
        assert_eq!(policy.retry_delay(), Duration::from_secs(1));
        assert_eq!(policy.worst_case(), Duration::from_secs(18));
    }

    #[test]
    fn rejects_zero_attempts_and_zero_timeout() {
        assert_eq!(
            RetryPolicy::new(0, Duration::from_secs(1), Duration::ZERO),
            Err(ConfigError::ZeroAttempts)
        );
        assert_eq!(
            RetryPolicy::default().with_attempt_timeout(Duration::ZERO),
            Err(ConfigError::ZeroTimeout)
        );
    }

    #[test]
    fn rejects_durations_finer_than_a_millisecond() {
        assert_eq!(
            RetryPolicy::default().with_attempt_timeout(Duration::from_micros(500)),
            Err(ConfigError::SubMillisecond {
                field: "attempt_timeout",
                duration: Duration::from_micros(500),
            })
        );
        assert!(
            RetryPolicy::default()
                .with_retry_delay(Duration::from_micros(1_500))
                .is_err()
        );

        let policy = RetryPolicy::default()
            .with_attempt_timeout(Duration::from_millis(1))
            .unwrap();
        let json = serde_json::to_string(&policy).unwrap();
        assert_eq!(serde_json::from_str::<RetryPolicy>(&json).unwrap(), policy);
    }

    #[test]
    fn should_retry_respects_max_attempts() {
        let policy = RetryPolicy::default();

        assert!(policy.should_retry(0));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
        assert!(!RetryPolicy::no_retry().should_retry(1));
    }

    #[test]
    fn deserializes_from_millisecond_config() {
        let policy: RetryPolicy = serde_json::from_str(
            r#"{ "max_attempts": 5, "attempt_timeout_ms": 250, "retry_delay_ms": 10 }"#,
        )
        .unwrap();
        assert_eq!(policy.max_attempts(), 5);
        assert_eq!(policy.attempt_timeout(), Duration::from_millis(250));
        assert_eq!(policy.retry_delay(), Duration::from_millis(10));

        let err = serde_json::from_str::<RetryPolicy>(r#"{ "max_attempts": 0 }"#).unwrap_err();
        assert!(err.to_string().contains("max_attempts must be at least 1"));
    }
}
