use std::sync::Arc;
use std::time::Duration;

use fleet_core::{BatchConfig, FleetError, InvocationState, RemoteCommandRunner, RunHandle};
use tokio::time::{sleep_until, timeout, Instant};
use tracing::{debug, warn};

/// Polling cadence and bounds for one dispatched invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub transient_delay: Duration,
    /// Wall-clock budget for the whole polling phase.
    pub max_wait: Duration,
    pub max_polls: u32,
}

impl PollSettings {
    pub fn from_config(config: &BatchConfig) -> Self {
        Self {
            interval: config.poll_interval(),
            transient_delay: config.transient_poll_delay(),
            max_wait: config.max_wait(),
            max_polls: config.max_poll_attempts,
        }
    }
}

#[derive(Debug)]
pub enum PollOutcome {
    Succeeded(String),
    /// The invocation reached a terminal non-success state.
    Failed(FleetError),
    /// Neither bound produced a terminal state.
    TimedOut,
}

/// Waits for a dispatched invocation to reach a terminal state.
///
/// The wall-clock deadline and the poll counter are checked independently,
/// and each status query is itself cut off at the deadline, so a remote that
/// keeps answering "in progress" or never answers cannot hold the caller
/// past `max_wait`.
pub struct InvocationPoller {
    runner: Arc<dyn RemoteCommandRunner>,
    settings: PollSettings,
}

impl Clone for InvocationPoller {
    fn clone(&self) -> Self {
        Self {
            runner: Arc::clone(&self.runner),
            settings: self.settings.clone(),
        }
    }
}

impl InvocationPoller {
    pub fn new(runner: Arc<dyn RemoteCommandRunner>, settings: PollSettings) -> Self {
        Self { runner, settings }
    }

    pub fn settings(&self) -> &PollSettings {
        &self.settings
    }

    pub async fn wait_for_completion(&self, handle: &RunHandle) -> PollOutcome {
        let deadline = Instant::now() + self.settings.max_wait;
        let mut polls = 0u32;

        while polls < self.settings.max_polls {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            polls += 1;

            let delay = match timeout(deadline - now, self.runner.poll_status(handle)).await {
                Err(_) => {
                    debug!("轮询超出等待时间: command_id={}", handle.command_id);
                    break;
                }
                Ok(Ok(status)) => match status.state {
                    InvocationState::Success => return PollOutcome::Succeeded(status.output),
                    InvocationState::Failed
                    | InvocationState::Cancelled
                    | InvocationState::TimedOut => {
                        let message = if status.error.is_empty() {
                            status.output
                        } else {
                            status.error
                        };
                        return PollOutcome::Failed(FleetError::RemoteFailure {
                            status: status.state.as_str().to_string(),
                            message,
                        });
                    }
                    InvocationState::Pending | InvocationState::InProgress => {
                        self.settings.interval
                    }
                },
                Ok(Err(e)) => {
                    if e.is_transient() {
                        debug!("调用尚未注册，稍后重试: {} ({})", handle.command_id, e);
                    } else {
                        warn!("查询调用状态失败，继续轮询: {} ({})", handle.command_id, e);
                    }
                    self.settings.transient_delay
                }
            };

            sleep_until((Instant::now() + delay).min(deadline)).await;
        }

        debug!(
            "调用未在限制内结束: command_id={}, polls={}",
            handle.command_id, polls
        );
        PollOutcome::TimedOut
    }
}
