use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use fleet_core::{FleetResult, TargetStatusProvider};

use crate::inventory::Inventory;

/// Answers reachability from the `reachable` flag in the inventory file.
pub struct InventoryStatusProvider {
    inventory: Arc<Inventory>,
}

impl InventoryStatusProvider {
    pub fn new(inventory: Arc<Inventory>) -> Self {
        Self { inventory }
    }
}

#[async_trait]
impl TargetStatusProvider for InventoryStatusProvider {
    async fn check_reachable(
        &self,
        location: &str,
        target_ids: &[String],
    ) -> FleetResult<HashMap<String, bool>> {
        Ok(target_ids
            .iter()
            .filter_map(|id| self.inventory.get(id))
            .filter(|entry| entry.location == location)
            .map(|entry| (entry.id.clone(), entry.reachable))
            .collect())
    }
}
