use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fleet_core::{BatchJobResult, FleetError, FleetResult, HistoryStore};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

/// Batch result history kept as a capped JSON array, most recent last.
pub struct JsonHistoryStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> FleetResult<Vec<BatchJobResult>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(FleetError::storage(format!(
                    "读取历史记录失败 {}: {e}",
                    self.path.display()
                )))
            }
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            FleetError::storage(format!("解析历史记录失败 {}: {e}", self.path.display()))
        })
    }

    async fn write_all(&self, results: &[BatchJobResult]) -> FleetResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FleetError::storage(format!("创建目录失败 {}: {e}", parent.display())))?;
        }

        let json = serde_json::to_string_pretty(results)
            .map_err(|e| FleetError::storage(format!("序列化历史记录失败: {e}")))?;

        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json)
            .await
            .map_err(|e| FleetError::storage(format!("写入历史记录失败 {}: {e}", tmp_path.display())))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| FleetError::storage(format!("替换历史记录失败 {}: {e}", self.path.display())))?;

        Ok(())
    }
}

#[async_trait]
impl HistoryStore for JsonHistoryStore {
    #[instrument(skip(self, results), fields(path = %self.path.display(), count = results.len()))]
    async fn append_and_flush(&self, results: &[BatchJobResult], cap: usize) -> FleetResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut history = match self.read_all().await {
            Ok(history) => history,
            Err(e) => {
                warn!("现有历史记录无法读取，将重新开始: {}", e);
                Vec::new()
            }
        };

        history.extend_from_slice(results);
        if history.len() > cap {
            let overflow = history.len() - cap;
            history.drain(..overflow);
        }

        self.write_all(&history).await?;
        debug!("历史记录已保存，共 {} 条", history.len());
        Ok(())
    }

    async fn load_recent(&self, limit: usize) -> FleetResult<Vec<BatchJobResult>> {
        let mut history = self.read_all().await?;
        if history.len() > limit {
            let overflow = history.len() - limit;
            history.drain(..overflow);
        }
        Ok(history)
    }
}
