use async_trait::async_trait;
use std::process::ExitStatus;

use crate::domain::error::Result;

/// Port trait for a supervised governance process
///
/// Hides how a process is signalled on a given platform behind a single
/// `terminate` operation, so callers never branch on the operating system.
/// Implementations must:
/// - Report the OS process id while the process is owned
/// - Report early exit without blocking
/// - Reap the process on termination
#[async_trait]
pub trait ProcessHandle: Send + Sync {
    /// OS process id, `None` once the process has been reaped
    fn pid(&self) -> Option<u32>;

    /// Argument vector the process was launched with (binary path first)
    fn argv(&self) -> &[String];

    /// Exit status if the process has already exited, without waiting
    fn try_exit_status(&mut self) -> Result<Option<ExitStatus>>;

    /// Stop the process and reap it
    ///
    /// Returns the exit status when it could be observed.
    async fn terminate(&mut self) -> Result<Option<ExitStatus>>;

    /// Best-effort synchronous kill used from `Drop`
    fn kill_now(&mut self);
}
