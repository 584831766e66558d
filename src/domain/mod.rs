//! Domain layer for Guardian
//!
//! Configuration, lifecycle, endpoint matching, and the port traits the
//! infrastructure layer implements.

pub mod error;
pub mod models;
pub mod ports;

pub use error::{GuardianError, Result};
