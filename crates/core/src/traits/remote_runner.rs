use std::time::Duration;

use async_trait::async_trait;

use crate::models::{BatchTarget, InvocationStatus, RunHandle};
use crate::FleetResult;

/// Dispatches a shell command to a remote target and reports its progress.
#[async_trait]
pub trait RemoteCommandRunner: Send + Sync {
    /// Send `command` to `target`. `timeout_hint` is the execution timeout the
    /// remote side should enforce.
    async fn submit(
        &self,
        target: &BatchTarget,
        command: &str,
        timeout_hint: Duration,
    ) -> FleetResult<RunHandle>;

    /// Query the current state of a dispatched command. Implementations return
    /// `FleetError::TransientRemote` while the invocation is not registered yet.
    async fn poll_status(&self, handle: &RunHandle) -> FleetResult<InvocationStatus>;
}
