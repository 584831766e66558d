pub mod config;
pub mod interception;
pub mod lifecycle;

pub use config::{
    ForwardingConfig, GuardianConfig, LivenessConfig, LoggingConfig, ReadinessConfig,
};
pub use interception::{InterceptionRule, DEFAULT_AI_PATTERNS, ORIGINAL_DESTINATION_HEADER};
pub use lifecycle::{LifecycleState, SharedLifecycle};
