//! Argument vector passed to the governance process.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::domain::models::GuardianConfig;

/// Rules file names probed in the working directory, in order
pub const RULES_FILE_CANDIDATES: [&str; 2] = ["guardian_rules.json", "src/guardian_rules.json"];

/// Flags understood by the governance process
///
/// ```text
/// <binary> -port=<int> -service=<string> -env=<string>
///          [-config=<path>] [-pre-prompt=<string>] [-debug=true]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GovernanceArgs {
    pub port: u16,
    pub service_name: String,
    pub environment: String,
    pub rules_path: Option<PathBuf>,
    pub pre_prompt: Option<String>,
    pub debug: bool,
}

impl GovernanceArgs {
    /// Build arguments from configuration, discovering rules relative to `cwd`
    pub fn from_config(config: &GuardianConfig, port: u16, cwd: &Path) -> Self {
        Self {
            port,
            service_name: config.service_name.clone(),
            environment: config.environment.clone(),
            rules_path: discover_rules(config.rules_path.as_deref(), cwd),
            pre_prompt: config
                .pre_prompt
                .clone()
                .filter(|prompt| !prompt.is_empty()),
            debug: config.debug,
        }
    }

    /// Render flags in the order the governance process documents them
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("-port={}", self.port),
            format!("-service={}", self.service_name),
            format!("-env={}", self.environment),
        ];
        if let Some(rules) = &self.rules_path {
            args.push(format!("-config={}", rules.display()));
        }
        if let Some(prompt) = &self.pre_prompt {
            args.push(format!("-pre-prompt={prompt}"));
        }
        if self.debug {
            args.push("-debug=true".to_string());
        }
        args
    }
}

/// Locate the rules file handed to the governance process
///
/// A configured path wins when it exists. Otherwise `cwd/guardian_rules.json`
/// and then `cwd/src/guardian_rules.json` are tried. Nothing is passed when
/// no file exists.
pub fn discover_rules(configured: Option<&Path>, cwd: &Path) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            info!(path = ?path, "using configured Guardian rules");
            return Some(path.to_path_buf());
        }
        warn!(path = ?path, "configured Guardian rules file does not exist, falling back to discovery");
    }

    RULES_FILE_CANDIDATES
        .iter()
        .map(|candidate| cwd.join(candidate))
        .find(|path| path.exists())
        .inspect(|path| info!(path = ?path, "using Guardian rules"))
}
