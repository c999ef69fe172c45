use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::target::BatchTarget;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum JobStatus {
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "FAILED")]
    Failed,
    #[serde(rename = "TIMEOUT")]
    Timeout,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Success => "SUCCESS",
            JobStatus::Failed => "FAILED",
            JobStatus::Timeout => "TIMEOUT",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Success)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final outcome of one command on one target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchJobResult {
    pub target: BatchTarget,
    pub command: String,
    pub status: JobStatus,
    pub output: String,
    pub error: String,
    /// Wall time from the first attempt's start to the final outcome, backoff included.
    pub execution_time_ms: u64,
    /// Total attempts made, the first one included.
    pub attempts: u32,
    pub timestamp: DateTime<Utc>,
}

impl BatchJobResult {
    pub fn success(
        target: BatchTarget,
        command: &str,
        output: String,
        elapsed: Duration,
        attempts: u32,
    ) -> Self {
        Self::build(target, command, JobStatus::Success, output, String::new(), elapsed, attempts)
    }

    pub fn failed(
        target: BatchTarget,
        command: &str,
        error: String,
        elapsed: Duration,
        attempts: u32,
    ) -> Self {
        Self::build(target, command, JobStatus::Failed, String::new(), error, elapsed, attempts)
    }

    pub fn timed_out(
        target: BatchTarget,
        command: &str,
        error: String,
        elapsed: Duration,
        attempts: u32,
    ) -> Self {
        Self::build(target, command, JobStatus::Timeout, String::new(), error, elapsed, attempts)
    }

    fn build(
        target: BatchTarget,
        command: &str,
        status: JobStatus,
        output: String,
        error: String,
        elapsed: Duration,
        attempts: u32,
    ) -> Self {
        Self {
            target,
            command: command.to_string(),
            status,
            output,
            error,
            execution_time_ms: elapsed.as_millis() as u64,
            attempts,
            timestamp: Utc::now(),
        }
    }

    pub fn execution_time(&self) -> Duration {
        Duration::from_millis(self.execution_time_ms)
    }
}
