//! CLI type definitions
//!
//! Clap structure for the `guardian-shim` launcher. Every flag overrides the
//! matching field of the loaded configuration.

use clap::Parser;
use std::path::PathBuf;

use crate::domain::models::GuardianConfig;

#[derive(Parser, Debug, Default)]
#[command(name = "guardian-shim")]
#[command(about = "Run a Guardian governance proxy for the lifetime of this process", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to guardian.yaml + .guardian/local.yaml)
    #[arg(short, long, env = "GUARDIAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Port for the governance proxy (allocated automatically when omitted)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Service name reported to Guardian
    #[arg(short, long)]
    pub service: Option<String>,

    /// Deployment environment reported to Guardian
    #[arg(short, long)]
    pub env: Option<String>,

    /// Pre-prompt injected by the governance proxy (empty disables it)
    #[arg(long)]
    pub pre_prompt: Option<String>,

    /// Rules file passed to the governance proxy
    #[arg(short, long)]
    pub rules: Option<PathBuf>,

    /// Explicit Guardian binary, bypassing platform resolution
    #[arg(short, long)]
    pub binary: Option<PathBuf>,

    /// Enable debug logging and forward the proxy's output
    #[arg(short, long)]
    pub debug: bool,
}

impl Cli {
    /// Apply command-line overrides on top of `config`
    pub fn apply(&self, config: &mut GuardianConfig) {
        if let Some(port) = self.port {
            config.port = Some(port);
        }
        if let Some(ref service) = self.service {
            config.service_name.clone_from(service);
        }
        if let Some(ref env) = self.env {
            config.environment.clone_from(env);
        }
        if let Some(ref pre_prompt) = self.pre_prompt {
            config.pre_prompt = Some(pre_prompt.clone()).filter(|p| !p.is_empty());
        }
        if let Some(ref rules) = self.rules {
            config.rules_path = Some(rules.clone());
        }
        if let Some(ref binary) = self.binary {
            config.binary_path = Some(binary.clone());
        }
        if self.debug {
            config.debug = true;
        }
    }
}
