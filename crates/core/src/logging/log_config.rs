use std::str::FromStr;

use crate::errors::FleetError;
use crate::logging::log_level::LogLevel;

/// Output format for log entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = FleetError;

    fn from_str(format: &str) -> Result<Self, Self::Err> {
        match format.to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            _ => Err(FleetError::Configuration(format!(
                "Unsupported log format: {format}"
            ))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Pretty,
        }
    }
}

impl LogConfig {
    pub fn new(level: LogLevel, format: LogFormat) -> Self {
        Self { level, format }
    }

    /// Apply `LOG_LEVEL` / `LOG_FORMAT` overrides; unparsable values are ignored.
    pub fn from_env(self) -> Self {
        let mut config = self;

        if let Ok(level_str) = std::env::var("LOG_LEVEL") {
            if let Ok(level) = level_str.parse::<LogLevel>() {
                config.level = level;
            }
        }

        if let Ok(format_str) = std::env::var("LOG_FORMAT") {
            if let Ok(format) = format_str.parse::<LogFormat>() {
                config.format = format;
            }
        }

        config
    }
}
