//! Guardian shim - local AI governance proxy supervisor
//!
//! Starts the Guardian governance binary as a child process on a private
//! port, waits until it answers its health endpoint, and reroutes the host's
//! AI API traffic (completions, chat, generate, engines) through it for as
//! long as the controller is alive.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): configuration, lifecycle, endpoint matching, port traits
//! - **Application Layer** (`application`): the [`GuardianController`] lifecycle
//! - **Infrastructure Layer** (`infrastructure`): processes, probing, interception, config, logging
//! - **CLI Layer** (`cli`): the `guardian-shim` launcher
//!
//! # Example
//!
//! ```no_run
//! use guardian_shim::{GuardedClient, GuardianConfig, GuardianController};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let mut guardian = GuardianController::new(GuardianConfig::for_service("billing"))?;
//! guardian.start().await?;
//!
//! let client = GuardedClient::new()?;
//! let reply = client
//!     .post("https://api.openai.com/v1/chat/completions")
//!     .body("{}")
//!     .send()
//!     .await?;
//! println!("{}", reply.status());
//!
//! guardian.stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use application::GuardianController;
pub use domain::error::GuardianError;
pub use domain::models::{
    ForwardingConfig, GuardianConfig, InterceptionRule, LifecycleState, LivenessConfig,
    LoggingConfig, ReadinessConfig, SharedLifecycle, ORIGINAL_DESTINATION_HEADER,
};
pub use domain::ports::{ProcessHandle, RequestInterceptor, Reroute};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use infrastructure::interception::{
    GuardedClient, GuardedRequestBuilder, GuardianForwarder, GuardianRoute, InterceptionGuard,
    InterceptorRegistry,
};
