use std::time::Duration;

use fleet_core::BatchConfig;

/// Linear backoff with a ceiling: the n-th retry waits `min(base * n, max)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    pub fn from_config(config: &BatchConfig) -> Self {
        Self::new(
            config.max_retries,
            config.retry_base_delay(),
            config.retry_max_delay(),
        )
    }

    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Sleep before `attempt` (1-based). The first attempt starts immediately.
    pub fn delay_before_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        self.base_delay
            .saturating_mul(attempt - 1)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&BatchConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_backoff_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.total_attempts(), 4);

        let delays: Vec<u64> = (1..=8)
            .map(|attempt| policy.delay_before_attempt(attempt).as_secs())
            .collect();
        assert_eq!(delays, vec![0, 10, 20, 30, 40, 50, 60, 60]);
    }

    #[test]
    fn test_zero_retries_means_single_attempt() {
        let policy = RetryPolicy::new(0, Duration::from_secs(10), Duration::from_secs(60));
        assert_eq!(policy.total_attempts(), 1);
    }
}
