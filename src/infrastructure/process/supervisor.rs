//! Governance Process Supervisor
//!
//! Spawns the governance binary as a child process, owns its handle, and
//! guarantees the child never outlives its owner.

use async_trait::async_trait;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{debug, error, info, warn};

use crate::domain::error::{GuardianError, Result};
use crate::domain::ports::ProcessHandle;

/// Child process running the governance binary
pub struct GovernanceProcess {
    child: Child,
    pid: Option<u32>,
    argv: Vec<String>,
    grace: Duration,
}

impl GovernanceProcess {
    /// Launch `path` with `args`
    ///
    /// In debug mode the child's stdout and stderr are inherited; otherwise
    /// they are discarded.
    pub fn spawn(path: &Path, args: &[String], debug: bool, grace: Duration) -> Result<Self> {
        if !path.exists() {
            return Err(GuardianError::BinaryNotFound(path.to_path_buf()));
        }

        let (stdout, stderr) = if debug {
            (Stdio::inherit(), Stdio::inherit())
        } else {
            (Stdio::null(), Stdio::null())
        };

        let child = Command::new(path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| GuardianError::SpawnFailed {
                path: path.to_path_buf(),
                source,
            })?;

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push(path.display().to_string());
        argv.extend(args.iter().cloned());

        let pid = child.id();
        info!(pid = ?pid, path = ?path, "Guardian process spawned");

        Ok(Self {
            child,
            pid,
            argv,
            grace,
        })
    }

    #[cfg(unix)]
    fn signal_terminate(&mut self, pid: u32) -> Result<()> {
        use nix::errno::Errno;
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let raw = i32::try_from(pid).map_err(|_| GuardianError::TerminateFailed {
            pid,
            reason: "pid out of range".to_string(),
        })?;

        match kill(Pid::from_raw(raw), Signal::SIGTERM) {
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(e) => Err(GuardianError::TerminateFailed {
                pid,
                reason: e.to_string(),
            }),
        }
    }

    #[cfg(not(unix))]
    fn signal_terminate(&mut self, pid: u32) -> Result<()> {
        self.child
            .start_kill()
            .map_err(|e| GuardianError::TerminateFailed {
                pid,
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl ProcessHandle for GovernanceProcess {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn argv(&self) -> &[String] {
        &self.argv
    }

    fn try_exit_status(&mut self) -> Result<Option<ExitStatus>> {
        let status = self
            .child
            .try_wait()
            .map_err(|e| GuardianError::TerminateFailed {
                pid: self.pid.unwrap_or_default(),
                reason: e.to_string(),
            })?;
        if status.is_some() {
            self.pid = None;
        }
        Ok(status)
    }

    async fn terminate(&mut self) -> Result<Option<ExitStatus>> {
        let Some(pid) = self.pid else {
            return Ok(None);
        };

        if let Some(status) = self.try_exit_status()? {
            debug!(pid, ?status, "Guardian process already exited");
            return Ok(Some(status));
        }

        self.signal_terminate(pid)?;

        let status = match tokio::time::timeout(self.grace, self.child.wait()).await {
            Ok(Ok(status)) => {
                info!(pid, ?status, "Guardian process exited");
                Some(status)
            }
            Ok(Err(e)) => {
                error!(pid, error = ?e, "Error waiting for Guardian process to exit");
                None
            }
            Err(_) => {
                warn!(pid, grace_ms = self.grace.as_millis(), "Guardian shutdown timeout, forcing kill");
                if let Err(e) = self.child.kill().await {
                    warn!(pid, error = ?e, "Failed to force kill Guardian process");
                }
                self.child.try_wait().ok().flatten()
            }
        };

        self.pid = None;
        Ok(status)
    }

    fn kill_now(&mut self) {
        if self.pid.take().is_some() {
            let _ = self.child.start_kill();
        }
    }
}

/// Owns at most one governance process at a time
pub struct ProcessSupervisor {
    handle: Option<Box<dyn ProcessHandle>>,
    grace: Duration,
}

impl ProcessSupervisor {
    /// Create a supervisor that waits up to `grace` for a terminated child to exit
    pub fn new(grace: Duration) -> Self {
        Self {
            handle: None,
            grace,
        }
    }

    /// Spawn the governance binary, replacing any process already owned
    pub async fn spawn(&mut self, path: &Path, args: &[String], debug: bool) -> Result<u32> {
        if self.handle.is_some() {
            warn!("Supervisor already owns a Guardian process, terminating it first");
            self.terminate().await?;
        }

        let process = GovernanceProcess::spawn(path, args, debug, self.grace)?;
        let pid = process.pid().unwrap_or_default();
        self.handle = Some(Box::new(process));
        Ok(pid)
    }

    /// Take ownership of an already running process
    pub fn adopt(&mut self, handle: Box<dyn ProcessHandle>) {
        if let Some(mut previous) = self.handle.replace(handle) {
            previous.kill_now();
        }
    }

    /// Terminate the owned process; a no-op when nothing is owned
    pub async fn terminate(&mut self) -> Result<Option<ExitStatus>> {
        match self.handle.take() {
            Some(mut handle) => {
                info!(pid = ?handle.pid(), "Stopping Guardian process");
                handle.terminate().await
            }
            None => Ok(None),
        }
    }

    /// Exit status if the owned process has died on its own
    pub fn exit_status(&mut self) -> Result<Option<ExitStatus>> {
        match self.handle.as_mut() {
            Some(handle) => handle.try_exit_status(),
            None => Ok(None),
        }
    }

    pub fn pid(&self) -> Option<u32> {
        self.handle.as_ref().and_then(|handle| handle.pid())
    }

    pub fn argv(&self) -> Option<&[String]> {
        self.handle.as_ref().map(|handle| handle.argv())
    }

    pub fn is_running(&self) -> bool {
        self.pid().is_some()
    }
}

impl Default for ProcessSupervisor {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl Drop for ProcessSupervisor {
    fn drop(&mut self) {
        // Ensure the child is killed when the supervisor is dropped
        if let Some(mut handle) = self.handle.take() {
            handle.kill_now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct FakeProcess {
        argv: Vec<String>,
        pid: Option<u32>,
        terminations: Arc<AtomicU32>,
        kills: Arc<AtomicU32>,
    }

    #[async_trait]
    impl ProcessHandle for FakeProcess {
        fn pid(&self) -> Option<u32> {
            self.pid
        }

        fn argv(&self) -> &[String] {
            &self.argv
        }

        fn try_exit_status(&mut self) -> Result<Option<ExitStatus>> {
            Ok(None)
        }

        async fn terminate(&mut self) -> Result<Option<ExitStatus>> {
            self.terminations.fetch_add(1, Ordering::SeqCst);
            self.pid = None;
            Ok(None)
        }

        fn kill_now(&mut self) {
            self.kills.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn fake(terminations: &Arc<AtomicU32>, kills: &Arc<AtomicU32>) -> Box<FakeProcess> {
        Box::new(FakeProcess {
            argv: vec!["guardian".to_string(), "-port=1".to_string()],
            pid: Some(42),
            terminations: terminations.clone(),
            kills: kills.clone(),
        })
    }

    #[tokio::test]
    async fn test_terminate_without_process_is_noop() {
        let mut supervisor = ProcessSupervisor::default();
        assert!(supervisor.terminate().await.unwrap().is_none());
        assert!(supervisor.terminate().await.unwrap().is_none());
        assert!(!supervisor.is_running());
    }

    #[tokio::test]
    async fn test_terminate_is_idempotent() {
        let terminations = Arc::new(AtomicU32::new(0));
        let kills = Arc::new(AtomicU32::new(0));
        let mut supervisor = ProcessSupervisor::default();
        supervisor.adopt(fake(&terminations, &kills));

        assert_eq!(supervisor.pid(), Some(42));
        assert_eq!(supervisor.argv().unwrap()[1], "-port=1");

        supervisor.terminate().await.unwrap();
        supervisor.terminate().await.unwrap();
        assert_eq!(terminations.load(Ordering::SeqCst), 1);
        assert!(!supervisor.is_running());
    }

    #[tokio::test]
    async fn test_drop_kills_owned_process() {
        let terminations = Arc::new(AtomicU32::new(0));
        let kills = Arc::new(AtomicU32::new(0));
        {
            let mut supervisor = ProcessSupervisor::default();
            supervisor.adopt(fake(&terminations, &kills));
        }
        assert_eq!(kills.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_spawn_missing_binary_is_not_found() {
        let mut supervisor = ProcessSupervisor::default();
        let missing = PathBuf::from("/definitely/not/here/guardian");
        let err = supervisor.spawn(&missing, &[], false).await.unwrap_err();
        assert!(matches!(err, GuardianError::BinaryNotFound(path) if path == missing));
        assert!(!supervisor.is_running());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_spawn_and_terminate_real_process() {
        let mut supervisor = ProcessSupervisor::new(Duration::from_secs(2));
        let pid = supervisor
            .spawn(Path::new("/bin/sleep"), &["30".to_string()], false)
            .await
            .unwrap();
        assert!(pid > 0);
        assert!(supervisor.exit_status().unwrap().is_none());

        let status = supervisor.terminate().await.unwrap();
        assert!(status.is_some());
        assert!(!supervisor.is_running());

        let alive = nix::sys::signal::kill(
            nix::unistd::Pid::from_raw(i32::try_from(pid).unwrap()),
            None,
        );
        assert!(alive.is_err(), "terminated process should be reaped");
    }
}
