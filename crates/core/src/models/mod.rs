pub mod invocation;
pub mod job_result;
pub mod target;

pub use invocation::{InvocationState, InvocationStatus, RunHandle};
pub use job_result::{BatchJobResult, JobStatus};
pub use target::BatchTarget;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_job_status_serde() {
        let json = serde_json::to_string(&JobStatus::Timeout).unwrap();
        assert_eq!(json, "\"TIMEOUT\"");
        let status: JobStatus = serde_json::from_str("\"SUCCESS\"").unwrap();
        assert!(status.is_success());
    }

    #[test]
    fn test_invocation_terminal_states() {
        assert!(!InvocationState::Pending.is_terminal());
        assert!(!InvocationState::InProgress.is_terminal());
        assert!(InvocationState::Success.is_terminal());
        assert!(InvocationState::Cancelled.is_terminal());
        assert!(InvocationState::TimedOut.is_terminal());
    }

    #[test]
    fn test_result_constructors() {
        let target = BatchTarget::new("i-0abc", "web-1", "ap-northeast-2");
        let result = BatchJobResult::failed(
            target.clone(),
            "uptime",
            "exit 1".to_string(),
            Duration::from_millis(1500),
            4,
        );
        assert_eq!(result.status, JobStatus::Failed);
        assert_eq!(result.execution_time_ms, 1500);
        assert_eq!(result.attempts, 4);
        assert!(result.output.is_empty());
        assert_eq!(result.target, target);
        assert_eq!(target.to_string(), "web-1 (i-0abc)");
    }
}
