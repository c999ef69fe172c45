use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Per-resource-class TTLs. High-churn classes get short TTLs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub default_ttl_seconds: u64,
    pub ttl_seconds: HashMap<String, u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let ttl_seconds = [
            ("instances", 120),
            ("ssm", 120),
            ("rds", 300),
            ("elasticache", 300),
            ("ecs", 600),
            ("eks", 600),
            ("regions", 3600),
            ("lambda", 300),
            ("cloudwatch", 120),
            ("s3", 600),
        ]
        .into_iter()
        .map(|(class, secs)| (class.to_string(), secs))
        .collect();

        Self {
            default_ttl_seconds: 300,
            ttl_seconds,
        }
    }
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.default_ttl_seconds == 0 {
            return Err(anyhow::anyhow!("默认缓存TTL必须大于0"));
        }

        for (class, secs) in &self.ttl_seconds {
            if class.is_empty() || class.contains('_') {
                return Err(anyhow::anyhow!(
                    "无效的资源类型名称: '{class}'（不能为空或包含'_'）"
                ));
            }
            if *secs == 0 {
                return Err(anyhow::anyhow!("资源类型 {class} 的TTL必须大于0"));
            }
        }

        Ok(())
    }
}
