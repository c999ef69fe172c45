//! Target inventory loaded from a TOML file
//!
//! ```toml
//! [[targets]]
//! id = "web-1"
//! name = "web server"
//! location = "local"
//! reachable = true
//! ```

use std::collections::HashSet;
use std::path::Path;

use fleet_core::{BatchTarget, FleetError, FleetResult};
use serde::{Deserialize, Serialize};

fn default_reachable() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryEntry {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub location: String,
    #[serde(default = "default_reachable")]
    pub reachable: bool,
}

impl InventoryEntry {
    pub fn to_target(&self) -> BatchTarget {
        BatchTarget::new(
            self.id.clone(),
            self.name.clone().unwrap_or_else(|| self.id.clone()),
            self.location.clone(),
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Inventory {
    #[serde(default)]
    pub targets: Vec<InventoryEntry>,
}

impl Inventory {
    pub fn from_toml(content: &str) -> FleetResult<Self> {
        let inventory: Inventory = toml::from_str(content)
            .map_err(|e| FleetError::Configuration(format!("解析目标清单失败: {e}")))?;
        inventory.validate()?;
        Ok(inventory)
    }

    pub async fn load(path: &Path) -> FleetResult<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            FleetError::Configuration(format!("读取目标清单失败 {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    fn validate(&self) -> FleetResult<()> {
        let mut seen = HashSet::new();
        for entry in &self.targets {
            if entry.id.is_empty() || entry.location.is_empty() {
                return Err(FleetError::Configuration(
                    "目标的id和location不能为空".to_string(),
                ));
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(FleetError::Configuration(format!(
                    "目标id重复: {}",
                    entry.id
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&InventoryEntry> {
        self.targets.iter().find(|entry| entry.id == id)
    }

    /// Targets matching every given filter. Empty `ids` matches all ids.
    pub fn select(&self, ids: &[String], location: Option<&str>) -> Vec<BatchTarget> {
        self.targets
            .iter()
            .filter(|entry| ids.is_empty() || ids.contains(&entry.id))
            .filter(|entry| location.map_or(true, |loc| entry.location == loc))
            .map(InventoryEntry::to_target)
            .collect()
    }
}
