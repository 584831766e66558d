use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

use super::models::lifecycle::LifecycleState;

/// Errors raised while starting, running, or stopping a Guardian controller
#[derive(Error, Debug)]
pub enum GuardianError {
    #[error("Guardian binary not found at {}", .0.display())]
    BinaryNotFound(PathBuf),

    #[error("Failed to spawn Guardian binary {}: {source}", path.display())]
    SpawnFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Guardian server on port {port} failed to start within {timeout:?}")]
    ReadinessTimeout { port: u16, timeout: Duration },

    #[error("Guardian process exited before becoming ready: {status}")]
    ProcessExited { status: ExitStatus },

    #[error("Failed to allocate a local port: {0}")]
    PortAllocation(#[source] std::io::Error),

    #[error("Failed to terminate Guardian process {pid}: {reason}")]
    TerminateFailed { pid: u32, reason: String },

    #[error("Invalid lifecycle transition from {from} to {to}")]
    InvalidTransition {
        from: LifecycleState,
        to: LifecycleState,
    },

    #[error("Forwarding to Guardian failed: {0}")]
    Forwarding(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GuardianError {
    /// True for failures that leave the controller in the `Error` state
    pub const fn is_start_failure(&self) -> bool {
        matches!(
            self,
            Self::BinaryNotFound(_)
                | Self::SpawnFailed { .. }
                | Self::ReadinessTimeout { .. }
                | Self::ProcessExited { .. }
                | Self::PortAllocation(_)
        )
    }
}

/// Result type alias for Guardian operations
pub type Result<T> = std::result::Result<T, GuardianError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = GuardianError::BinaryNotFound(PathBuf::from("/opt/guardian/bin/guardian"));
        assert_eq!(
            err.to_string(),
            "Guardian binary not found at /opt/guardian/bin/guardian"
        );

        let err = GuardianError::ReadinessTimeout {
            port: 4100,
            timeout: Duration::from_secs(10),
        };
        assert!(err.to_string().contains("port 4100"));
        assert!(err.is_start_failure());

        let err = GuardianError::InvalidTransition {
            from: LifecycleState::Stopped,
            to: LifecycleState::Ready,
        };
        assert_eq!(
            err.to_string(),
            "Invalid lifecycle transition from stopped to ready"
        );
        assert!(!err.is_start_failure());
    }
}
