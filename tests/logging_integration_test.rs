// Integration tests for logging functionality
// Note: LoggerImpl::init installs a global subscriber, so this file holds a
// single test.

use guardian_shim::infrastructure::logging::{LogConfig, LogFormat, LoggerImpl, RotationPolicy};
use guardian_shim::LoggingConfig;
use std::fs;
use tempfile::TempDir;
use tracing::{info, warn};

#[test]
fn test_logging_writes_json_file() {
    let temp_dir = TempDir::new().unwrap();

    let settings = LoggingConfig {
        level: "info".to_string(),
        format: "json".to_string(),
        log_dir: Some(temp_dir.path().to_path_buf()),
    };
    let config = LogConfig {
        enable_stderr: false,
        rotation: RotationPolicy::Never,
        ..LogConfig::from_settings(&settings, false)
    };
    assert_eq!(config.format, LogFormat::Json);

    let logger = temp_env::with_var_unset("RUST_LOG", || LoggerImpl::init(&config)).unwrap();

    info!(port = 4100, "Guardian proxy is ready");
    warn!(path = "/v1/chat/completions", "Guardian unreachable");
    tracing::debug!("filtered out at info level");

    // Dropping the logger flushes the non-blocking writer
    drop(logger);

    let contents = fs::read_to_string(temp_dir.path().join("guardian.log")).unwrap();
    let lines: Vec<serde_json::Value> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert!(lines
        .iter()
        .any(|line| line["fields"]["message"] == "Guardian proxy is ready"
            && line["fields"]["port"] == 4100));
    assert!(lines
        .iter()
        .any(|line| line["level"] == "WARN" && line["fields"]["path"] == "/v1/chat/completions"));
    assert!(!contents.contains("filtered out at info level"));

    // A second global subscriber is rejected
    assert!(LoggerImpl::init(&LogConfig::default()).is_err());
}
