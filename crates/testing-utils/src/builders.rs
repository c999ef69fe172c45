//! Test data builders for targets and results

use chrono::{DateTime, Utc};
use fleet_core::{BatchJobResult, BatchTarget, JobStatus};

/// `count` targets in `location` with ids `i-000`, `i-001`, ...
pub fn targets(count: usize, location: &str) -> Vec<BatchTarget> {
    (0..count)
        .map(|i| TargetBuilder::new().with_id(&format!("i-{i:03}")).with_location(location).build())
        .collect()
}

/// Builder for creating test BatchTarget values
pub struct TargetBuilder {
    target: BatchTarget,
}

impl TargetBuilder {
    pub fn new() -> Self {
        Self {
            target: BatchTarget::new("i-test", "test-host", "local"),
        }
    }

    /// Sets the id and, unless already customised, a matching display name.
    pub fn with_id(mut self, id: &str) -> Self {
        if self.target.display_name == "test-host" {
            self.target.display_name = format!("host-{id}");
        }
        self.target.id = id.to_string();
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.target.display_name = name.to_string();
        self
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.target.location_hint = location.to_string();
        self
    }

    pub fn build(self) -> BatchTarget {
        self.target
    }
}

impl Default for TargetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating test BatchJobResult values
pub struct JobResultBuilder {
    result: BatchJobResult,
}

impl JobResultBuilder {
    pub fn new(target: BatchTarget) -> Self {
        Self {
            result: BatchJobResult {
                target,
                command: "uptime".to_string(),
                status: JobStatus::Success,
                output: "ok".to_string(),
                error: String::new(),
                execution_time_ms: 100,
                attempts: 1,
                timestamp: Utc::now(),
            },
        }
    }

    pub fn with_command(mut self, command: &str) -> Self {
        self.result.command = command.to_string();
        self
    }

    pub fn failed(mut self, error: &str) -> Self {
        self.result.status = JobStatus::Failed;
        self.result.output.clear();
        self.result.error = error.to_string();
        self
    }

    pub fn timed_out(mut self) -> Self {
        self.result.status = JobStatus::Timeout;
        self.result.output.clear();
        self.result.error = "Command timed out".to_string();
        self
    }

    pub fn with_output(mut self, output: &str) -> Self {
        self.result.output = output.to_string();
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.result.attempts = attempts;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.result.timestamp = timestamp;
        self
    }

    pub fn build(self) -> BatchJobResult {
        self.result
    }
}
