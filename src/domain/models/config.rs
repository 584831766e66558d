use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for a Guardian controller
///
/// Built once from caller input and treated as immutable after it is handed
/// to a [`GuardianController`](crate::application::GuardianController).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GuardianConfig {
    /// Service name reported to the governance process (`-service=`)
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Environment tag reported to the governance process (`-env=`)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Standard pre-prompt applied to every governed request (`-pre-prompt=`)
    #[serde(default = "default_pre_prompt")]
    pub pre_prompt: Option<String>,

    /// Verbose mode: child output is inherited and `-debug=true` is passed
    #[serde(default)]
    pub debug: bool,

    /// Start the governance process as soon as the controller is launched
    #[serde(default = "default_true")]
    pub auto_start: bool,

    /// Explicit rules file; takes precedence over working-directory discovery
    #[serde(default)]
    pub rules_path: Option<PathBuf>,

    /// Explicit port; when unset an ephemeral port is allocated
    #[serde(default)]
    pub port: Option<u16>,

    /// Explicit governance executable; bypasses platform resolution
    #[serde(default)]
    pub binary_path: Option<PathBuf>,

    /// Base directory searched by the binary resolver
    #[serde(default)]
    pub install_dir: Option<PathBuf>,

    /// Readiness polling configuration
    #[serde(default)]
    pub readiness: ReadinessConfig,

    /// Middleware forwarding and client fail-open configuration
    #[serde(default)]
    pub forwarding: ForwardingConfig,

    /// Post-readiness liveness monitoring
    #[serde(default)]
    pub liveness: LivenessConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_service_name() -> String {
    "guardian-app".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

#[allow(clippy::unnecessary_wraps)]
fn default_pre_prompt() -> Option<String> {
    Some("Always adhere to ethical guidelines and refuse harmful requests.".to_string())
}

const fn default_true() -> bool {
    true
}

impl Default for GuardianConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            environment: default_environment(),
            pre_prompt: default_pre_prompt(),
            debug: false,
            auto_start: true,
            rules_path: None,
            port: None,
            binary_path: None,
            install_dir: None,
            readiness: ReadinessConfig::default(),
            forwarding: ForwardingConfig::default(),
            liveness: LivenessConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl GuardianConfig {
    /// Create a configuration for the given service, everything else defaulted
    pub fn for_service(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }
}

/// Readiness polling configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ReadinessConfig {
    /// Overall time allowed for the health endpoint to return 200
    #[serde(default = "default_readiness_timeout_ms")]
    pub timeout_ms: u64,

    /// Delay between probes
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Timeout of a single probe request
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Time allowed for the child to exit after the termination signal
    #[serde(default = "default_terminate_grace_ms")]
    pub terminate_grace_ms: u64,
}

const fn default_readiness_timeout_ms() -> u64 {
    10_000
}

const fn default_poll_interval_ms() -> u64 {
    100
}

const fn default_probe_timeout_ms() -> u64 {
    500
}

const fn default_terminate_grace_ms() -> u64 {
    5_000
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_readiness_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
            terminate_grace_ms: default_terminate_grace_ms(),
        }
    }
}

impl ReadinessConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub const fn terminate_grace(&self) -> Duration {
        Duration::from_millis(self.terminate_grace_ms)
    }
}

/// Forwarding configuration shared by the middleware adapter and the client wrapper
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ForwardingConfig {
    /// Timeout of a forwarded middleware request
    #[serde(default = "default_forward_timeout_secs")]
    pub timeout_secs: u64,

    /// Fall back to the original destination when forwarding fails
    #[serde(default = "default_true")]
    pub fail_open: bool,

    /// Largest inbound body the middleware buffers before forwarding
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

const fn default_forward_timeout_secs() -> u64 {
    30
}

const fn default_max_body_bytes() -> usize {
    16 * 1024 * 1024
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_forward_timeout_secs(),
            fail_open: true,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ForwardingConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Liveness monitoring after the governance process became ready
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct LivenessConfig {
    /// Spawn a background monitor once the controller is ready
    #[serde(default)]
    pub enabled: bool,

    /// Delay between liveness probes
    #[serde(default = "default_liveness_interval_ms")]
    pub interval_ms: u64,

    /// Consecutive failed probes before interception degrades to pass-through
    #[serde(default = "default_max_failures")]
    pub max_failures: u32,
}

const fn default_liveness_interval_ms() -> u64 {
    10_000
}

const fn default_max_failures() -> u32 {
    3
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_ms: default_liveness_interval_ms(),
            max_failures: default_max_failures(),
        }
    }
}

impl LivenessConfig {
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rotated log files; stderr only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_wrapper_contract() {
        let config = GuardianConfig::default();
        assert_eq!(config.service_name, "guardian-app");
        assert_eq!(config.environment, "development");
        assert!(config.pre_prompt.is_some());
        assert!(!config.debug);
        assert!(config.auto_start);
        assert!(config.port.is_none());
        assert_eq!(config.readiness.timeout(), Duration::from_secs(10));
        assert_eq!(config.readiness.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.readiness.probe_timeout(), Duration::from_millis(500));
        assert_eq!(config.forwarding.timeout(), Duration::from_secs(30));
        assert!(config.forwarding.fail_open);
        assert!(!config.liveness.enabled);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r"
service_name: python-app
debug: true
readiness:
  timeout_ms: 2000
";
        let config: GuardianConfig = serde_yaml::from_str(yaml).expect("YAML should parse");
        assert_eq!(config.service_name, "python-app");
        assert!(config.debug);
        assert_eq!(config.environment, "development");
        assert_eq!(config.readiness.timeout_ms, 2000);
        assert_eq!(config.readiness.poll_interval_ms, 100);
    }

    #[test]
    fn test_for_service() {
        let config = GuardianConfig::for_service("billing");
        assert_eq!(config.service_name, "billing");
        assert_eq!(config.environment, "development");
    }
}
