use serde::{Deserialize, Serialize};

/// Tracking handle returned by a successful dispatch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RunHandle {
    pub command_id: String,
    pub target_id: String,
    pub location_hint: String,
}

/// Remote-side state of a dispatched invocation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum InvocationState {
    Pending,
    InProgress,
    Success,
    Failed,
    Cancelled,
    TimedOut,
}

impl InvocationState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            InvocationState::Success
                | InvocationState::Failed
                | InvocationState::Cancelled
                | InvocationState::TimedOut
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InvocationState::Pending => "Pending",
            InvocationState::InProgress => "InProgress",
            InvocationState::Success => "Success",
            InvocationState::Failed => "Failed",
            InvocationState::Cancelled => "Cancelled",
            InvocationState::TimedOut => "TimedOut",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InvocationStatus {
    pub state: InvocationState,
    pub output: String,
    pub error: String,
}

impl InvocationStatus {
    pub fn in_progress() -> Self {
        Self {
            state: InvocationState::InProgress,
            output: String::new(),
            error: String::new(),
        }
    }

    pub fn succeeded(output: impl Into<String>) -> Self {
        Self {
            state: InvocationState::Success,
            output: output.into(),
            error: String::new(),
        }
    }

    pub fn failed(state: InvocationState, error: impl Into<String>) -> Self {
        Self {
            state,
            output: String::new(),
            error: error.into(),
        }
    }
}
