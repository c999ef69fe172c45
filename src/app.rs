use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use fleet_core::{
    AppConfig, BatchConfig, BatchJobResult, HistoryStore, RemoteCommandRunner,
    TargetStatusProvider,
};
use fleet_dispatcher::{BatchExecutor, BatchReport, RedriveDecider};
use fleet_infrastructure::{
    CachedStatusProvider, Inventory, InventoryStatusProvider, JsonHistoryStore, LocalShellRunner,
    ReachabilityMap, ResourceCache, TtlPolicy,
};
use tracing::info;

/// Command-line overrides for the batch settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOverrides {
    pub concurrency: Option<usize>,
    pub max_retries: Option<u32>,
    pub timeout_seconds: Option<u64>,
}

impl BatchOverrides {
    pub fn apply(&self, config: &mut BatchConfig) {
        if let Some(concurrency) = self.concurrency {
            config.max_concurrency = concurrency;
        }
        if let Some(max_retries) = self.max_retries {
            config.max_retries = max_retries;
        }
        if let Some(timeout) = self.timeout_seconds {
            config.command_timeout_seconds = timeout;
        }
    }
}

/// Which inventory targets a run applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetSelection {
    /// Empty selects every id.
    pub ids: Vec<String>,
    pub location: Option<String>,
}

/// 主应用程序
pub struct Application {
    config: AppConfig,
    inventory: Arc<Inventory>,
    cache: ResourceCache<ReachabilityMap>,
    history_store: Arc<dyn HistoryStore>,
    executor: BatchExecutor,
}

impl Application {
    /// Wire the local runner, the cached inventory status provider and the
    /// JSON history store around `config`.
    pub fn new(config: AppConfig, inventory: Inventory) -> Result<Self> {
        let runner: Arc<dyn RemoteCommandRunner> = Arc::new(LocalShellRunner::new());
        Self::with_runner(config, inventory, runner)
    }

    pub fn with_runner(
        config: AppConfig,
        inventory: Inventory,
        runner: Arc<dyn RemoteCommandRunner>,
    ) -> Result<Self> {
        config.validate().context("配置验证失败")?;
        info!(
            "初始化应用程序: profile={}, 目标数={}",
            config.profile,
            inventory.targets.len()
        );

        let inventory = Arc::new(inventory);
        let cache = ResourceCache::new(TtlPolicy::from_config(&config.cache));
        let status_provider: Arc<dyn TargetStatusProvider> = Arc::new(CachedStatusProvider::new(
            Arc::new(InventoryStatusProvider::new(Arc::clone(&inventory))),
            cache.clone(),
            config.profile.clone(),
        ));
        let history_store: Arc<dyn HistoryStore> =
            Arc::new(JsonHistoryStore::new(config.history.path.clone()));

        let executor = BatchExecutor::new(
            runner,
            status_provider,
            Arc::clone(&history_store),
            &config.batch,
            config.history.max_entries,
        );

        Ok(Self {
            config,
            inventory,
            cache,
            history_store,
            executor,
        })
    }

    pub async fn load_inventory(path: &Path) -> Result<Inventory> {
        Inventory::load(path)
            .await
            .with_context(|| format!("加载目标清单失败: {}", path.display()))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn cache(&self) -> &ResourceCache<ReachabilityMap> {
        &self.cache
    }

    /// Run `command` on the selected targets, offering re-drives to `decider`.
    pub async fn run(
        &self,
        command: &str,
        selection: &TargetSelection,
        decider: &dyn RedriveDecider,
    ) -> Result<BatchReport> {
        let targets = self
            .inventory
            .select(&selection.ids, selection.location.as_deref());
        if targets.is_empty() {
            anyhow::bail!("目标清单中没有匹配的目标");
        }

        info!("对 {} 个目标执行命令: {}", targets.len(), command);
        Ok(self
            .executor
            .execute_with_redrive(targets, command, decider)
            .await)
    }

    pub async fn recent_history(&self, limit: usize) -> Result<Vec<BatchJobResult>> {
        self.history_store
            .load_recent(limit)
            .await
            .context("读取执行历史失败")
    }
}
