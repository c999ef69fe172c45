pub mod history_store;
pub mod remote_runner;
pub mod status_provider;

pub use history_store::HistoryStore;
pub use remote_runner::RemoteCommandRunner;
pub use status_provider::TargetStatusProvider;
