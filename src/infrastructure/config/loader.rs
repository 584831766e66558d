use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::GuardianConfig;

/// Project configuration file, relative to the working directory
pub const PROJECT_CONFIG_FILE: &str = "guardian.yaml";

/// Local override file, relative to the working directory
pub const LOCAL_CONFIG_FILE: &str = ".guardian/local.yaml";

/// Prefix of environment variable overrides
pub const ENV_PREFIX: &str = "GUARDIAN_";

/// Configuration error types
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Service name cannot be empty")]
    EmptyServiceName,

    #[error("Environment cannot be empty")]
    EmptyEnvironment,

    #[error("Invalid port: 0. Use no port to allocate one automatically")]
    InvalidPort,

    #[error("Invalid readiness timeout: {0}ms. Must be positive")]
    InvalidReadinessTimeout(u64),

    #[error("Invalid poll interval: {0}ms. Must be positive")]
    InvalidPollInterval(u64),

    #[error(
        "Invalid probe timeout: probe_timeout_ms ({0}) must be less than timeout_ms ({1})"
    )]
    InvalidProbeTimeout(u64, u64),

    #[error("Invalid forward timeout: {0}s. Must be positive")]
    InvalidForwardTimeout(u64),

    #[error("Invalid liveness max_failures: 0. Must be at least 1")]
    InvalidMaxFailures,

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. guardian.yaml (project config)
    /// 3. .guardian/local.yaml (local overrides, optional)
    /// 4. Environment variables (GUARDIAN_* prefix, `__` for nesting)
    pub fn load() -> Result<GuardianConfig> {
        let config: GuardianConfig = Self::figment()
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honouring env overrides
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<GuardianConfig> {
        let config: GuardianConfig = Figment::new()
            .merge(Serialized::defaults(GuardianConfig::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(GuardianConfig::default()))
            .merge(Yaml::file(PROJECT_CONFIG_FILE))
            .merge(Yaml::file(LOCAL_CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(config: &GuardianConfig) -> Result<(), ConfigError> {
        if config.service_name.trim().is_empty() {
            return Err(ConfigError::EmptyServiceName);
        }

        if config.environment.trim().is_empty() {
            return Err(ConfigError::EmptyEnvironment);
        }

        if config.port == Some(0) {
            return Err(ConfigError::InvalidPort);
        }

        let readiness = &config.readiness;
        if readiness.timeout_ms == 0 {
            return Err(ConfigError::InvalidReadinessTimeout(readiness.timeout_ms));
        }

        if readiness.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidPollInterval(readiness.poll_interval_ms));
        }

        if readiness.probe_timeout_ms == 0 || readiness.probe_timeout_ms >= readiness.timeout_ms {
            return Err(ConfigError::InvalidProbeTimeout(
                readiness.probe_timeout_ms,
                readiness.timeout_ms,
            ));
        }

        if config.forwarding.timeout_secs == 0 {
            return Err(ConfigError::InvalidForwardTimeout(config.forwarding.timeout_secs));
        }

        if config.liveness.max_failures == 0 {
            return Err(ConfigError::InvalidMaxFailures);
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const OVERRIDE_VARS: [&str; 2] = [
        "GUARDIAN_SERVICE_NAME",
        "GUARDIAN_READINESS__POLL_INTERVAL_MS",
    ];

    #[test]
    fn test_default_config_is_valid() {
        ConfigLoader::validate(&GuardianConfig::default()).expect("Default config should be valid");
    }

    #[test]
    fn test_validate_empty_service_name() {
        let config = GuardianConfig {
            service_name: "  ".to_string(),
            ..Default::default()
        };
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::EmptyServiceName)
        );
    }

    #[test]
    fn test_validate_empty_environment() {
        let config = GuardianConfig {
            environment: String::new(),
            ..Default::default()
        };
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::EmptyEnvironment)
        );
    }

    #[test]
    fn test_validate_zero_port() {
        let config = GuardianConfig {
            port: Some(0),
            ..Default::default()
        };
        assert_eq!(ConfigLoader::validate(&config), Err(ConfigError::InvalidPort));
    }

    #[test]
    fn test_validate_probe_timeout_exceeds_overall() {
        let mut config = GuardianConfig::default();
        config.readiness.timeout_ms = 400;
        config.readiness.probe_timeout_ms = 500;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidProbeTimeout(500, 400))
        );
    }

    #[test]
    fn test_validate_zero_poll_interval() {
        let mut config = GuardianConfig::default();
        config.readiness.poll_interval_ms = 0;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidPollInterval(0))
        );
    }

    #[test]
    fn test_validate_zero_forward_timeout() {
        let mut config = GuardianConfig::default();
        config.forwarding.timeout_secs = 0;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidForwardTimeout(0))
        );
    }

    #[test]
    fn test_validate_zero_max_failures() {
        let mut config = GuardianConfig::default();
        config.liveness.max_failures = 0;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxFailures)
        );
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = GuardianConfig::default();
        config.logging.level = "invalid".to_string();
        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "invalid"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = GuardianConfig::default();
        config.logging.format = "xml".to_string();
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogFormat("xml".to_string()))
        );
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "service_name: python-app\nenvironment: staging\ndebug: true\nport: 4100"
        )
        .unwrap();
        file.flush().unwrap();

        let config = temp_env::with_vars_unset(OVERRIDE_VARS, || {
            ConfigLoader::load_from_file(file.path()).unwrap()
        });
        assert_eq!(config.service_name, "python-app");
        assert_eq!(config.environment, "staging");
        assert!(config.debug);
        assert_eq!(config.port, Some(4100));
        assert!(config.auto_start, "unset fields keep defaults");
    }

    #[test]
    fn test_load_from_file_rejects_invalid() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "service_name: ''").unwrap();
        file.flush().unwrap();

        temp_env::with_vars_unset(OVERRIDE_VARS, || {
            assert!(ConfigLoader::load_from_file(file.path()).is_err());
        });
    }

    #[test]
    fn test_env_override() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "service_name: from-file\nreadiness:\n  timeout_ms: 2000").unwrap();
        file.flush().unwrap();

        temp_env::with_vars(
            [
                ("GUARDIAN_SERVICE_NAME", Some("from-env")),
                ("GUARDIAN_READINESS__POLL_INTERVAL_MS", Some("50")),
            ],
            || {
                let config = ConfigLoader::load_from_file(file.path()).unwrap();
                assert_eq!(config.service_name, "from-env", "Env should win");
                assert_eq!(config.readiness.timeout_ms, 2000, "File value should persist");
                assert_eq!(config.readiness.poll_interval_ms, 50);
            },
        );
    }

    #[test]
    fn test_hierarchical_merging() {
        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(
            base_file,
            "service_name: base\nlogging:\n  level: info\n  format: json"
        )
        .unwrap();
        base_file.flush().unwrap();

        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(override_file, "service_name: override\nlogging:\n  level: debug").unwrap();
        override_file.flush().unwrap();

        let config: GuardianConfig = Figment::new()
            .merge(Serialized::defaults(GuardianConfig::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.service_name, "override", "Override should win");
        assert_eq!(config.logging.level, "debug", "Override should win for nested fields");
        assert_eq!(config.logging.format, "json", "Base value should persist when not overridden");
    }
}
