use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use fleet_core::{FleetResult, TargetStatusProvider};
use tracing::{debug, instrument};

use crate::cache::{cache_key, ResourceCache};

/// Resource class under which reachability maps are cached.
pub const REACHABILITY_CLASS: &str = "ssm";

pub type ReachabilityMap = HashMap<String, bool>;

/// Caches each location's reachability map and refreshes it ahead of expiry.
pub struct CachedStatusProvider {
    inner: Arc<dyn TargetStatusProvider>,
    cache: ResourceCache<ReachabilityMap>,
    profile: String,
}

impl CachedStatusProvider {
    pub fn new(
        inner: Arc<dyn TargetStatusProvider>,
        cache: ResourceCache<ReachabilityMap>,
        profile: impl Into<String>,
    ) -> Self {
        Self {
            inner,
            cache,
            profile: profile.into(),
        }
    }

    pub fn cache_key_for(&self, location: &str) -> String {
        cache_key(REACHABILITY_CLASS, &self.profile, location)
    }
}

#[async_trait]
impl TargetStatusProvider for CachedStatusProvider {
    #[instrument(skip(self, target_ids), fields(count = target_ids.len()))]
    async fn check_reachable(
        &self,
        location: &str,
        target_ids: &[String],
    ) -> FleetResult<HashMap<String, bool>> {
        let key = self.cache_key_for(location);

        // 缓存的结果必须覆盖所有请求的id，否则视为未命中
        if let Some(cached) = self.cache.get(&key) {
            if target_ids.iter().all(|id| cached.contains_key(id)) {
                let inner = Arc::clone(&self.inner);
                let location_owned = location.to_string();
                // 刷新整张位置表，避免子集查询缩小缓存
                let mut ids: Vec<String> = cached.keys().cloned().collect();
                ids.sort();
                self.cache.start_background_refresh(&key, move || async move {
                    inner.check_reachable(&location_owned, &ids).await
                });

                return Ok(target_ids
                    .iter()
                    .filter_map(|id| cached.get(id).map(|ok| (id.clone(), *ok)))
                    .collect());
            }
            debug!("缓存的可达性结果不完整，重新查询: {}", key);
        }

        let fresh = self.inner.check_reachable(location, target_ids).await?;
        self.cache.set(&key, fresh.clone());
        Ok(fresh)
    }
}
