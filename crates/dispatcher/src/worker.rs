use std::sync::Arc;
use std::time::Duration;

use fleet_core::{BatchJobResult, BatchTarget, RemoteCommandRunner};
use metrics::counter;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument, warn};

use crate::poller::{InvocationPoller, PollOutcome};
use crate::retry::RetryPolicy;

/// Terminal outcome of a single attempt.
#[derive(Debug)]
pub enum AttemptOutcome {
    Success(String),
    Failed(String),
    Timeout,
    SubmitError(String),
}

impl AttemptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Success(_))
    }
}

/// Runs the full retry loop for one target.
pub struct TargetWorker {
    runner: Arc<dyn RemoteCommandRunner>,
    poller: InvocationPoller,
    retry_policy: RetryPolicy,
    command_timeout: Duration,
}

impl Clone for TargetWorker {
    fn clone(&self) -> Self {
        Self {
            runner: Arc::clone(&self.runner),
            poller: self.poller.clone(),
            retry_policy: self.retry_policy.clone(),
            command_timeout: self.command_timeout,
        }
    }
}

impl TargetWorker {
    pub fn new(
        runner: Arc<dyn RemoteCommandRunner>,
        poller: InvocationPoller,
        retry_policy: RetryPolicy,
        command_timeout: Duration,
    ) -> Self {
        Self {
            runner,
            poller,
            retry_policy,
            command_timeout,
        }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// One pass through submit and polling.
    pub async fn attempt(&self, target: &BatchTarget, command: &str) -> AttemptOutcome {
        let handle = match self
            .runner
            .submit(target, command, self.command_timeout)
            .await
        {
            Ok(handle) => handle,
            Err(e) => return AttemptOutcome::SubmitError(e.to_string()),
        };
        debug!("命令已提交: target={}, command_id={}", target.id, handle.command_id);

        match self.poller.wait_for_completion(&handle).await {
            PollOutcome::Succeeded(output) => AttemptOutcome::Success(output),
            PollOutcome::Failed(e) => AttemptOutcome::Failed(e.to_string()),
            PollOutcome::TimedOut => AttemptOutcome::Timeout,
        }
    }

    /// Always yields a result. The final attempt's outcome is reported as-is.
    #[instrument(skip(self, command), fields(target = %target.id))]
    pub async fn run(&self, target: BatchTarget, command: &str) -> BatchJobResult {
        let started = Instant::now();
        let total = self.retry_policy.total_attempts();
        let mut attempt = 1;

        loop {
            let delay = self.retry_policy.delay_before_attempt(attempt);
            if !delay.is_zero() {
                info!("{}s 后重试 {} (第 {}/{} 次)", delay.as_secs(), target, attempt, total);
                sleep(delay).await;
            }

            counter!("fleet_batch_attempts_total").increment(1);
            let outcome = self.attempt(&target, command).await;

            if let AttemptOutcome::Success(output) = outcome {
                info!("✓ {}: 执行成功 (第 {} 次尝试)", target, attempt);
                return BatchJobResult::success(target, command, output, started.elapsed(), attempt);
            }

            if attempt >= total {
                return self.final_result(target, command, outcome, started.elapsed(), attempt);
            }

            warn!("{} 第 {} 次尝试未成功: {:?}", target, attempt, outcome);
            attempt += 1;
        }
    }

    fn final_result(
        &self,
        target: BatchTarget,
        command: &str,
        outcome: AttemptOutcome,
        elapsed: Duration,
        attempts: u32,
    ) -> BatchJobResult {
        match outcome {
            AttemptOutcome::Timeout => {
                let error = format!(
                    "Command timed out after {}s",
                    self.poller.settings().max_wait.as_secs()
                );
                warn!("⏱ {}: {}", target, error);
                BatchJobResult::timed_out(target, command, error, elapsed, attempts)
            }
            AttemptOutcome::Failed(error) => {
                warn!("✗ {}: {}", target, error);
                BatchJobResult::failed(target, command, error, elapsed, attempts)
            }
            AttemptOutcome::SubmitError(error) => {
                warn!("✗ {}: {}", target, error);
                BatchJobResult::failed(target, command, error, elapsed, attempts)
            }
            AttemptOutcome::Success(output) => {
                BatchJobResult::success(target, command, output, elapsed, attempts)
            }
        }
    }
}

/// Result recorded when a worker task dies instead of returning.
pub fn executor_error_result(
    target: BatchTarget,
    command: &str,
    error: impl std::fmt::Display,
    elapsed: Duration,
) -> BatchJobResult {
    BatchJobResult::failed(target, command, format!("Executor error: {error}"), elapsed, 1)
}
