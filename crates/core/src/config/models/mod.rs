pub mod app_config;
pub mod batch;
pub mod cache;
pub mod history_observability;

pub use app_config::AppConfig;
pub use batch::BatchConfig;
pub use cache::CacheConfig;
pub use history_observability::{HistoryConfig, ObservabilityConfig};
