//! Infrastructure layer module
//!
//! Adapters around the operating system and the network:
//! - Governance binary resolution
//! - Local port allocation
//! - Child process supervision
//! - Health probing and liveness monitoring
//! - AI traffic interception
//! - Configuration management
//! - Logging infrastructure

pub mod binary;
pub mod config;
pub mod health;
pub mod interception;
pub mod logging;
pub mod net;
pub mod process;
