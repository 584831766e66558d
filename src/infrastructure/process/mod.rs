//! Governance process management
//!
//! - `GovernanceArgs` - argv contract of the governance binary
//! - `GovernanceProcess` - platform-specific `ProcessHandle`
//! - `ProcessSupervisor` - exclusive owner of the running process

pub mod args;
pub mod supervisor;

pub use args::{discover_rules, GovernanceArgs, RULES_FILE_CANDIDATES};
pub use supervisor::{GovernanceProcess, ProcessSupervisor};
