use anyhow::Context;
use std::str::FromStr;

use crate::utils::RetryConfig;

// ============================================================================
// Loyalty Runtime Configuration
// ============================================================================

/// What a canceled account does with mutation signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CanceledSignalPolicy {
    /// Accept the signal and discard it
    #[default]
    Ignore,
    /// Report `AccountCanceled` to callers that wait for a reply
    Reject,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoyaltyConfig {
    /// Events one run may record before it continues as a fresh run
    pub history_threshold: usize,
    /// Backoff for notification delivery
    pub notification_retry: RetryConfig,
    pub canceled_signal_policy: CanceledSignalPolicy,
}

impl Default for LoyaltyConfig {
    fn default() -> Self {
        Self {
            history_threshold: 10_000,
            notification_retry: RetryConfig::notification(),
            canceled_signal_policy: CanceledSignalPolicy::Ignore,
        }
    }
}

impl LoyaltyConfig {
    /// Small thresholds and immediate retries, for tests and demos
    pub fn local() -> Self {
        Self {
            history_threshold: 1_000,
            notification_retry: RetryConfig::immediate(3),
            ..Self::default()
        }
    }

    pub fn with_history_threshold(mut self, threshold: usize) -> Self {
        self.history_threshold = threshold.max(1);
        self
    }

    pub fn with_canceled_signal_policy(mut self, policy: CanceledSignalPolicy) -> Self {
        self.canceled_signal_policy = policy;
        self
    }

    /// Overlay `LOYALTY_*` environment variables on the defaults
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(threshold) = parse_var::<usize, _>(&lookup, "LOYALTY_HISTORY_THRESHOLD")? {
            config = config.with_history_threshold(threshold);
        }
        if let Some(attempts) = parse_var::<u32, _>(&lookup, "LOYALTY_NOTIFICATION_ATTEMPTS")? {
            config.notification_retry.max_attempts = attempts.max(1);
        }
        if let Some(policy) = lookup("LOYALTY_CANCELED_SIGNALS") {
            config.canceled_signal_policy = match policy.to_ascii_lowercase().as_str() {
                "ignore" => CanceledSignalPolicy::Ignore,
                "reject" => CanceledSignalPolicy::Reject,
                other => anyhow::bail!("LOYALTY_CANCELED_SIGNALS must be 'ignore' or 'reject', got '{}'", other),
            };
        }

        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| raw.trim().parse::<T>().with_context(|| format!("Invalid value for {}: '{}'", key, raw)))
        .transpose()
}
