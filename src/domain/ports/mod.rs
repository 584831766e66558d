//! Port trait definitions (Hexagonal Architecture)
//!
//! - ProcessHandle: lifecycle of a supervised governance process
//! - RequestInterceptor: rewrite of outbound requests before they are sent
//!
//! These traits keep the controller independent of how processes are
//! signalled and how HTTP requests are rewritten.

pub mod process_handle;
pub mod request_interceptor;

pub use process_handle::ProcessHandle;
pub use request_interceptor::{RequestInterceptor, Reroute};
