use async_trait::async_trait;

use crate::models::BatchJobResult;
use crate::FleetResult;

/// Durable, append-only batch result history with a retention cap.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Append `results` and keep only the most recent `cap` entries.
    async fn append_and_flush(&self, results: &[BatchJobResult], cap: usize) -> FleetResult<()>;

    /// Most recent entries, oldest first, at most `limit` of them.
    async fn load_recent(&self, limit: usize) -> FleetResult<Vec<BatchJobResult>>;
}
