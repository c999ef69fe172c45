use std::collections::HashMap;

use async_trait::async_trait;

use crate::FleetResult;

/// Reports whether targets in one location are reachable and managed.
#[async_trait]
pub trait TargetStatusProvider: Send + Sync {
    /// Ids missing from the returned map are treated as unreachable.
    async fn check_reachable(
        &self,
        location: &str,
        target_ids: &[String],
    ) -> FleetResult<HashMap<String, bool>>;
}
