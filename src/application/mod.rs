//! Application layer
//!
//! Orchestrates the infrastructure components into the controller lifecycle.

pub mod guardian_controller;

pub use guardian_controller::GuardianController;
