//! Governance binary discovery

pub mod resolver;

pub use resolver::{BinaryResolver, Platform, DEFAULT_BINARY_NAME};
