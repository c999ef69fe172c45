pub mod cached;
pub mod inventory_provider;

pub use cached::{CachedStatusProvider, ReachabilityMap, REACHABILITY_CLASS};
pub use inventory_provider::InventoryStatusProvider;
