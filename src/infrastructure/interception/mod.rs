//! Traffic interception
//!
//! Reroutes AI endpoint traffic to a local governance process:
//! - `GuardianRoute` - per-controller rewrite of matching requests
//! - `InterceptorRegistry` - ordered table of installed routes
//! - `GuardedClient` - outbound `reqwest` wrapper consulting a registry
//! - `GuardianForwarder` - inbound axum middleware with fail-open fallback

pub mod client;
pub mod middleware;
pub mod registry;
pub mod route;

pub use client::{GuardedClient, GuardedRequestBuilder};
pub use middleware::{forward_ai_requests, GuardianForwarder};
pub use registry::{InterceptionGuard, InterceptorRegistry};
pub use route::{local_target, GuardianRoute};
