use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::logging::{LogConfig, LogFormat, LogLevel};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HistoryConfig {
    pub path: PathBuf,
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        let path = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".fleet_batch_results.json");

        Self {
            path,
            max_entries: 100,
        }
    }
}

impl HistoryConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("历史记录文件路径不能为空"));
        }

        if self.max_entries == 0 {
            return Err(anyhow::anyhow!("历史记录最大条数必须大于0"));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

impl ObservabilityConfig {
    pub fn log_config(&self) -> anyhow::Result<LogConfig> {
        let level: LogLevel = self.log_level.parse()?;
        let format: LogFormat = self.log_format.parse()?;
        Ok(LogConfig::new(level, format))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.log_config().map(|_| ())
    }
}
