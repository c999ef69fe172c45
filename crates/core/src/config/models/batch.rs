use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BatchConfig {
    /// Upper bound on concurrently running targets.
    pub max_concurrency: usize,
    /// Additional attempts after the first one.
    pub max_retries: u32,
    pub retry_base_delay_seconds: u64,
    pub retry_max_delay_seconds: u64,
    /// Execution timeout handed to the remote side.
    pub command_timeout_seconds: u64,
    /// Extra polling budget on top of the command timeout.
    pub wait_grace_seconds: u64,
    pub poll_interval_seconds: u64,
    /// Delay before polling again after a transient lookup error.
    pub transient_poll_delay_seconds: u64,
    pub max_poll_attempts: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 5,
            max_retries: 3,
            retry_base_delay_seconds: 10,
            retry_max_delay_seconds: 60,
            command_timeout_seconds: 120,
            wait_grace_seconds: 30,
            poll_interval_seconds: 3,
            transient_poll_delay_seconds: 2,
            max_poll_attempts: 200,
        }
    }
}

impl BatchConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_seconds)
    }

    /// Wall-clock polling budget for one attempt.
    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.command_timeout_seconds + self.wait_grace_seconds)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_secs(self.retry_base_delay_seconds)
    }

    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_secs(self.retry_max_delay_seconds)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    pub fn transient_poll_delay(&self) -> Duration {
        Duration::from_secs(self.transient_poll_delay_seconds)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_concurrency == 0 {
            return Err(anyhow::anyhow!("最大并发数必须大于0"));
        }

        if self.command_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("命令超时时间必须大于0"));
        }

        if self.poll_interval_seconds == 0 {
            return Err(anyhow::anyhow!("轮询间隔必须大于0"));
        }

        if self.max_poll_attempts == 0 {
            return Err(anyhow::anyhow!("最大轮询次数必须大于0"));
        }

        if self.retry_max_delay_seconds < self.retry_base_delay_seconds {
            return Err(anyhow::anyhow!(
                "最大重试间隔({})不能小于基础重试间隔({})",
                self.retry_max_delay_seconds,
                self.retry_base_delay_seconds
            ));
        }

        Ok(())
    }
}
