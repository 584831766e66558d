use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::models::LoggingConfig;

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format (json, pretty)
    #[serde(default = "default_format")]
    pub format: LogFormat,

    /// Directory for log files (optional, if None logs only to stderr)
    pub log_dir: Option<PathBuf>,

    /// Enable stderr logging
    #[serde(default = "default_true")]
    pub enable_stderr: bool,

    /// Log rotation policy
    #[serde(default)]
    pub rotation: RotationPolicy,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    #[default]
    Daily,
    Hourly,
    Never,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_format(),
            log_dir: None,
            enable_stderr: true,
            rotation: RotationPolicy::default(),
        }
    }
}

impl LogConfig {
    /// Derive logger settings from the controller's logging section
    ///
    /// `debug` raises the level to at least `debug`.
    pub fn from_settings(settings: &LoggingConfig, debug: bool) -> Self {
        let level = if debug && matches!(settings.level.as_str(), "info" | "warn" | "error") {
            "debug".to_string()
        } else {
            settings.level.clone()
        };
        let format = if settings.format == "json" {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        };

        Self {
            level,
            format,
            log_dir: settings.log_dir.clone(),
            ..Self::default()
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_format() -> LogFormat {
    LogFormat::Pretty
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_raises_level() {
        let settings = LoggingConfig::default();
        assert_eq!(LogConfig::from_settings(&settings, true).level, "debug");
        assert_eq!(LogConfig::from_settings(&settings, false).level, "info");

        let trace = LoggingConfig {
            level: "trace".to_string(),
            ..Default::default()
        };
        assert_eq!(LogConfig::from_settings(&trace, true).level, "trace");
    }

    #[test]
    fn test_format_mapping() {
        let json = LoggingConfig {
            format: "json".to_string(),
            ..Default::default()
        };
        assert_eq!(LogConfig::from_settings(&json, false).format, LogFormat::Json);
        assert_eq!(
            LogConfig::from_settings(&LoggingConfig::default(), false).format,
            LogFormat::Pretty
        );
    }
}
