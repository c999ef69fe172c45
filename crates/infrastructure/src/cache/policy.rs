use std::collections::HashMap;
use std::time::Duration;

use fleet_core::CacheConfig;

/// Separator between the segments of a cache key.
pub const KEY_SEPARATOR: char = '_';

/// Resource class used when a key carries no class prefix.
pub const DEFAULT_CLASS: &str = "default";

/// Maps resource classes to TTLs.
#[derive(Debug, Clone, PartialEq)]
pub struct TtlPolicy {
    ttls: HashMap<String, Duration>,
    default_ttl: Duration,
}

impl TtlPolicy {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            ttls: HashMap::new(),
            default_ttl,
        }
    }

    pub fn with_class(mut self, class: &str, ttl: Duration) -> Self {
        self.ttls.insert(class.to_lowercase(), ttl);
        self
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        config
            .ttl_seconds
            .iter()
            .fold(Self::new(config.default_ttl()), |policy, (class, secs)| {
                policy.with_class(class, Duration::from_secs(*secs))
            })
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Text before the first separator, lowercased. Keys without a separator
    /// belong to the default class.
    pub fn resource_class(key: &str) -> String {
        match key.split_once(KEY_SEPARATOR) {
            Some((class, _)) => class.to_lowercase(),
            None => DEFAULT_CLASS.to_string(),
        }
    }

    pub fn ttl_for_key(&self, key: &str) -> Duration {
        self.ttls
            .get(&Self::resource_class(key))
            .copied()
            .unwrap_or(self.default_ttl)
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}
