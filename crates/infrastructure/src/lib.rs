pub mod cache;
pub mod history;
pub mod inventory;
pub mod runner;
pub mod status;

pub use cache::{cache_key, read_through, CacheEntry, CacheStats, ResourceCache, TtlPolicy};
pub use history::JsonHistoryStore;
pub use inventory::{Inventory, InventoryEntry};
pub use runner::LocalShellRunner;
pub use status::{CachedStatusProvider, InventoryStatusProvider, ReachabilityMap};
