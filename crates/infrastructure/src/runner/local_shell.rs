use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fleet_core::{
    BatchTarget, FleetError, FleetResult, InvocationState, InvocationStatus, RemoteCommandRunner,
    RunHandle,
};
use tokio::process::Command;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Runs each command through `sh -c` on the local machine.
///
/// Every submit spawns a child process immediately and returns a handle; a
/// background task collects the output and records the final state, which
/// `poll_status` then reports. A terminal state is reported once and then
/// dropped. The target is exposed to the command through
/// `FLEET_TARGET_ID`, `FLEET_TARGET_NAME` and `FLEET_TARGET_LOCATION`.
pub struct LocalShellRunner {
    shell: String,
    invocations: Arc<RwLock<HashMap<String, InvocationStatus>>>,
}

impl LocalShellRunner {
    pub fn new() -> Self {
        Self::with_shell("sh")
    }

    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            invocations: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of invocations still tracked.
    pub async fn tracked(&self) -> usize {
        self.invocations.read().await.len()
    }
}

impl Default for LocalShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

fn join_output(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim_end().to_string()
}

#[async_trait]
impl RemoteCommandRunner for LocalShellRunner {
    #[instrument(skip(self, command), fields(target = %target.id))]
    async fn submit(
        &self,
        target: &BatchTarget,
        command: &str,
        timeout_hint: Duration,
    ) -> FleetResult<RunHandle> {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(command)
            .env("FLEET_TARGET_ID", &target.id)
            .env("FLEET_TARGET_NAME", &target.display_name)
            .env("FLEET_TARGET_LOCATION", &target.location_hint)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .map_err(|e| FleetError::submit(format!("启动Shell命令失败: {e}")))?;

        let command_id = Uuid::new_v4().to_string();
        self.invocations
            .write()
            .await
            .insert(command_id.clone(), InvocationStatus::in_progress());

        info!("命令已提交: command_id={}, target={}", command_id, target);

        let invocations = Arc::clone(&self.invocations);
        let id = command_id.clone();
        tokio::spawn(async move {
            let status = match tokio::time::timeout(timeout_hint, child.wait_with_output()).await {
                Ok(Ok(output)) if output.status.success() => {
                    InvocationStatus::succeeded(join_output(&output.stdout))
                }
                Ok(Ok(output)) => {
                    let stderr = join_output(&output.stderr);
                    let error = if stderr.is_empty() {
                        format!("命令执行失败，退出码: {:?}", output.status.code())
                    } else {
                        stderr
                    };
                    InvocationStatus {
                        state: InvocationState::Failed,
                        output: join_output(&output.stdout),
                        error,
                    }
                }
                Ok(Err(e)) => {
                    warn!("等待进程结束失败: command_id={}, error={}", id, e);
                    InvocationStatus::failed(InvocationState::Failed, format!("等待进程结束失败: {e}"))
                }
                // 超时后子进程随future一起被丢弃并终止
                Err(_) => InvocationStatus::failed(
                    InvocationState::TimedOut,
                    format!("execution exceeded {}s", timeout_hint.as_secs()),
                ),
            };

            debug!("命令结束: command_id={}, state={}", id, status.state.as_str());
            invocations.write().await.insert(id, status);
        });

        Ok(RunHandle {
            command_id,
            target_id: target.id.clone(),
            location_hint: target.location_hint.clone(),
        })
    }

    async fn poll_status(&self, handle: &RunHandle) -> FleetResult<InvocationStatus> {
        let not_registered =
            || FleetError::transient(format!("invocation {} not registered", handle.command_id));

        let mut invocations = self.invocations.write().await;
        let status = invocations
            .get(&handle.command_id)
            .cloned()
            .ok_or_else(not_registered)?;
        if status.state.is_terminal() {
            invocations.remove(&handle.command_id);
            debug!("命令状态已取走: command_id={}", handle.command_id);
        }
        Ok(status)
    }
}
