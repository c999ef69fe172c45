use thiserror::Error;

/// Fleet错误类型定义
#[derive(Debug, Error)]
pub enum FleetError {
    /// The remote side has not registered the invocation yet, or asked us to slow down.
    #[error("transient remote error: {0}")]
    TransientRemote(String),

    /// The command ran on the target and ended in a non-success state.
    #[error("remote command {status}: {message}")]
    RemoteFailure { status: String, message: String },

    /// The dispatch call itself failed before a handle was obtained.
    #[error("command submission failed: {0}")]
    Submit(String),

    #[error("target validation failed: {0}")]
    Validation(String),

    #[error("history storage error: {0}")]
    Storage(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl FleetError {
    /// Errors the invocation poller absorbs and keeps polling through.
    pub fn is_transient(&self) -> bool {
        matches!(self, FleetError::TransientRemote(_))
    }

    pub fn transient(message: impl Into<String>) -> Self {
        FleetError::TransientRemote(message.into())
    }

    pub fn submit(message: impl Into<String>) -> Self {
        FleetError::Submit(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        FleetError::Storage(message.into())
    }
}

impl From<serde_json::Error> for FleetError {
    fn from(err: serde_json::Error) -> Self {
        FleetError::Serialization(err.to_string())
    }
}

/// 统一的Result类型
pub type FleetResult<T> = std::result::Result<T, FleetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(FleetError::transient("InvocationDoesNotExist").is_transient());
        assert!(!FleetError::submit("access denied").is_transient());
        assert!(!FleetError::RemoteFailure {
            status: "Failed".to_string(),
            message: "exit 1".to_string(),
        }
        .is_transient());
    }

    #[test]
    fn test_error_display() {
        let err = FleetError::RemoteFailure {
            status: "Cancelled".to_string(),
            message: "operator abort".to_string(),
        };
        assert_eq!(err.to_string(), "remote command Cancelled: operator abort");

        let err: FleetError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, FleetError::Io(_)));
    }
}
