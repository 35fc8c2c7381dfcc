//! Retry configuration loading (serde and environment).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::policy::RetryPolicy;

pub const ENV_MAX_ATTEMPTS: &str = "HOUSEBAZAAR_RETRY_MAX_ATTEMPTS";
pub const ENV_TIMEOUT_MS: &str = "HOUSEBAZAAR_RETRY_TIMEOUT_MS";
pub const ENV_DELAY_MS: &str = "HOUSEBAZAAR_RETRY_DELAY_MS";

/// Unvalidated, plain-number form of [`RetryPolicy`].
///
/// Missing fields take the policy defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicyConfig {
    pub max_attempts: u32,
    pub attempt_timeout_ms: u64,
    pub retry_delay_ms: u64,
}

impl Default for RetryPolicyConfig {
    fn default() -> Self {
        RetryPolicy::default().into()
    }
}

impl RetryPolicyConfig {
    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through `lookup`; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(v) = parse_var(&lookup, ENV_MAX_ATTEMPTS)? {
            config.max_attempts = v as u32;
        }
        if let Some(v) = parse_var(&lookup, ENV_TIMEOUT_MS)? {
            config.attempt_timeout_ms = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_DELAY_MS)? {
            config.retry_delay_ms = v;
        }
        Ok(config)
    }

    pub fn into_policy(self) -> Result<RetryPolicy, ConfigError> {
        RetryPolicy::try_from(self)
    }
}

fn parse_var<F>(lookup: &F, key: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let parsed = raw.trim().parse::<u64>();
    match parsed {
        Ok(v) if key != ENV_MAX_ATTEMPTS || v <= u64::from(u32::MAX) => Ok(Some(v)),
        _ => Err(ConfigError::InvalidValue { key, value: raw }),
    }
}

impl TryFrom<RetryPolicyConfig> for RetryPolicy {
    type Error = ConfigError;

    fn try_from(config: RetryPolicyConfig) -> Result<Self, Self::Error> {
        RetryPolicy::new(
            config.max_attempts,
            Duration::from_millis(config.attempt_timeout_ms),
            Duration::from_millis(config.retry_delay_ms),
        )
    }
}

impl From<RetryPolicy> for RetryPolicyConfig {
    fn from(policy: RetryPolicy) -> Self {
        Self {
            max_attempts: policy.max_attempts(),
            attempt_timeout_ms: millis(policy.attempt_timeout()),
            retry_delay_ms: millis(policy.retry_delay()),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl RetryPolicy {
    /// Policy from `HOUSEBAZAAR_RETRY_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        RetryPolicyConfig::from_env()?.into_policy()
    }
}
