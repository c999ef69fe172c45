pub mod config;
pub mod errors;
pub mod logging;
pub mod models;
pub mod traits;

pub use config::{AppConfig, BatchConfig, CacheConfig, HistoryConfig, ObservabilityConfig};
pub use errors::*;
pub use models::{BatchJobResult, BatchTarget, InvocationState, InvocationStatus, JobStatus, RunHandle};
pub use traits::{HistoryStore, RemoteCommandRunner, TargetStatusProvider};
