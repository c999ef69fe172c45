use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use fleet_core::{BatchTarget, TargetStatusProvider};
use tracing::{info, instrument, warn};

/// Pre-flight reachability check, one status query per location group.
pub struct TargetValidator {
    provider: Arc<dyn TargetStatusProvider>,
}

impl TargetValidator {
    pub fn new(provider: Arc<dyn TargetStatusProvider>) -> Self {
        Self { provider }
    }

    /// Keeps the targets reported reachable, in their original order.
    ///
    /// Ids missing from a location's answer count as unreachable. When the
    /// query for a location fails, that location's targets are kept as-is.
    #[instrument(skip_all, fields(targets = targets.len()))]
    pub async fn validate(&self, targets: Vec<BatchTarget>) -> Vec<BatchTarget> {
        let mut groups: Vec<(String, Vec<String>)> = Vec::new();
        let mut group_index: HashMap<&str, usize> = HashMap::new();
        for target in &targets {
            let index = *group_index
                .entry(target.location_hint.as_str())
                .or_insert_with(|| {
                    groups.push((target.location_hint.clone(), Vec::new()));
                    groups.len() - 1
                });
            groups[index].1.push(target.id.clone());
        }

        let mut dropped: HashSet<String> = HashSet::new();
        for (location, ids) in &groups {
            match self.provider.check_reachable(location, ids).await {
                Ok(reachable) => {
                    for id in ids {
                        if !reachable.get(id).copied().unwrap_or(false) {
                            dropped.insert(id.clone());
                        }
                    }
                }
                Err(e) => {
                    warn!("目标状态校验失败，跳过校验: location={}, error={}", location, e);
                }
            }
        }

        let validated: Vec<BatchTarget> = targets
            .into_iter()
            .filter(|target| {
                let keep = !dropped.contains(&target.id);
                if !keep {
                    warn!("目标不可达，已跳过: {}", target);
                }
                keep
            })
            .collect();

        info!("目标校验完成: {} 个可用, {} 个已跳过", validated.len(), dropped.len());
        validated
    }
}
