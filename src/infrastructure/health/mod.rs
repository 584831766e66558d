//! Governance process health checks
//!
//! - `ReadinessProber` - poll-until-ready with a bounded timeout
//! - `LivenessMonitor` - optional background probing once ready

pub mod liveness;
pub mod prober;

pub use liveness::LivenessMonitor;
pub use prober::{health_url, ReadinessProber, HEALTH_PATH};
