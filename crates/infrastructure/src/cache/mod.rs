//! Resource caching for the fleet tool
//!
//! Values fetched from slow upstream APIs are kept for a TTL that depends on
//! the resource class encoded at the front of the cache key. Hot keys are kept
//! fresh by background refreshes that never block readers.

pub mod manager;
pub mod policy;
pub mod read_through;

pub use manager::*;
pub use policy::*;
pub use read_through::*;

/// Cache statistics and metrics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub invalidations: u64,
    pub expirations: u64,
    pub refreshes_started: u64,
    pub refresh_failures: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Build `<class>_<profile>_<region>`.
pub fn cache_key(class: &str, profile: &str, region: &str) -> String {
    format!("{class}{KEY_SEPARATOR}{profile}{KEY_SEPARATOR}{region}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_building() {
        assert_eq!(cache_key("instances", "prod", "us-east-1"), "instances_prod_us-east-1");
        assert_eq!(
            TtlPolicy::resource_class(&cache_key("ssm", "dev", "eu-west-1")),
            "ssm"
        );
    }

    #[test]
    fn test_cache_stats() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            ..Default::default()
        };

        assert!((stats.hit_rate() - 0.8).abs() < f64::EPSILON);
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }
}
