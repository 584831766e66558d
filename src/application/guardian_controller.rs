//! Guardian controller
//!
//! Owns one governance process and the interception route that sends the
//! host's AI traffic to it. `start()` resolves the binary, picks a port,
//! spawns the process, waits for readiness and installs the route. `stop()`
//! undoes all of it.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::error::{GuardianError, Result};
use crate::domain::models::{GuardianConfig, InterceptionRule, LifecycleState, SharedLifecycle};
use crate::infrastructure::binary::BinaryResolver;
use crate::infrastructure::config::ConfigError;
use crate::infrastructure::health::{LivenessMonitor, ReadinessProber};
use crate::infrastructure::interception::{
    GuardianForwarder, GuardianRoute, InterceptionGuard, InterceptorRegistry,
};
use crate::infrastructure::net::PortAllocator;
use crate::infrastructure::process::{GovernanceArgs, ProcessSupervisor};

/// Background liveness task and the channel that stops it
struct LivenessTask {
    shutdown_tx: broadcast::Sender<()>,
    handle: JoinHandle<()>,
}

/// Lifecycle owner for a single governance process
pub struct GuardianController {
    id: Uuid,
    config: GuardianConfig,
    resolver: BinaryResolver,
    allocator: PortAllocator,
    prober: ReadinessProber,
    supervisor: ProcessSupervisor,
    lifecycle: Arc<SharedLifecycle>,
    registry: Arc<InterceptorRegistry>,
    guard: Option<InterceptionGuard>,
    liveness: Option<LivenessTask>,
}

impl GuardianController {
    /// Create a controller that installs into the process-wide registry
    pub fn new(config: GuardianConfig) -> Result<Self> {
        Self::with_registry(config, InterceptorRegistry::shared())
    }

    /// Create a controller bound to an explicit registry
    pub fn with_registry(config: GuardianConfig, registry: Arc<InterceptorRegistry>) -> Result<Self> {
        if config.port == Some(0) {
            return Err(GuardianError::Config(ConfigError::InvalidPort.to_string()));
        }

        let resolver = BinaryResolver::from_config(&config);
        let prober = ReadinessProber::new(&config.readiness)?;
        let supervisor = ProcessSupervisor::new(config.readiness.terminate_grace());

        Ok(Self {
            id: Uuid::new_v4(),
            config,
            resolver,
            allocator: PortAllocator::new(),
            prober,
            supervisor,
            lifecycle: Arc::new(SharedLifecycle::new()),
            registry,
            guard: None,
            liveness: None,
        })
    }

    /// Create a controller and start it right away when `auto_start` is set
    pub async fn launch(config: GuardianConfig) -> Result<Self> {
        let mut controller = Self::new(config)?;
        if controller.config.auto_start {
            controller.start().await?;
        }
        Ok(controller)
    }

    /// Start the governance process and begin intercepting AI traffic
    ///
    /// A no-op when already `Ready`. On failure the spawned process is
    /// terminated and the state becomes `Error`; the allocated port stays
    /// visible until `stop()`.
    #[instrument(skip(self), fields(controller = %self.id, service = %self.config.service_name))]
    pub async fn start(&mut self) -> Result<()> {
        if self.lifecycle.state().is_ready() {
            warn!(port = ?self.lifecycle.port(), "Guardian already started");
            return Ok(());
        }

        self.lifecycle.transition(LifecycleState::Starting)?;

        match self.launch_process().await {
            Ok(port) => {
                self.lifecycle.set_healthy(true);
                self.lifecycle.transition(LifecycleState::Ready)?;
                self.install_route();
                self.spawn_liveness(port);
                info!(port, pid = ?self.supervisor.pid(), "Guardian started");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Failed to start Guardian");
                if let Err(term) = self.supervisor.terminate().await {
                    warn!(error = %term, "Failed to clean up Guardian process");
                }
                self.lifecycle.transition(LifecycleState::Error)?;
                Err(e)
            }
        }
    }

    /// Stop intercepting and terminate the governance process
    ///
    /// Idempotent, and safe to call on a controller that never started.
    #[instrument(skip(self), fields(controller = %self.id))]
    pub async fn stop(&mut self) -> Result<()> {
        if self.lifecycle.state() == LifecycleState::Stopped {
            debug!("Guardian already stopped");
            return Ok(());
        }

        self.lifecycle.transition(LifecycleState::Stopping)?;

        if let Some(mut guard) = self.guard.take() {
            guard.release();
        }
        self.stop_liveness().await;

        let result = self.supervisor.terminate().await;
        self.lifecycle.set_port(None);
        self.lifecycle.transition(LifecycleState::Stopped)?;

        match result {
            Ok(status) => {
                info!(exit_status = ?status, "Guardian stopped");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Resolve, allocate and spawn, then wait for the health endpoint
    async fn launch_process(&mut self) -> Result<u16> {
        let binary = self.resolver.resolve();
        let port = self.allocator.reserve_or(self.config.port)?;
        self.lifecycle.set_port(Some(port));

        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let args = GovernanceArgs::from_config(&self.config, port, &cwd).to_args();
        debug!(binary = %binary.display(), ?args, "launching Guardian");

        self.supervisor
            .spawn(&binary, &args, self.config.debug)
            .await?;

        let supervisor = &mut self.supervisor;
        self.prober
            .wait_until_ready_while(port, self.config.readiness.timeout(), || {
                match supervisor.exit_status()? {
                    Some(status) => Err(GuardianError::ProcessExited { status }),
                    None => Ok(()),
                }
            })
            .await?;

        Ok(port)
    }

    fn install_route(&mut self) {
        let route: Arc<GuardianRoute> = Arc::new(self.route());
        match self.registry.install(self.id, route) {
            Some(guard) => self.guard = Some(guard),
            None => debug!("interception already installed for this controller"),
        }
    }

    fn spawn_liveness(&mut self, port: u16) {
        if !self.config.liveness.enabled {
            return;
        }

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let monitor = LivenessMonitor::new(
            self.prober.clone(),
            Arc::clone(&self.lifecycle),
            &self.config.liveness,
        );
        let handle = monitor.start_monitoring(port, shutdown_rx);
        self.liveness = Some(LivenessTask {
            shutdown_tx,
            handle,
        });
    }

    async fn stop_liveness(&mut self) {
        if let Some(task) = self.liveness.take() {
            let _ = task.shutdown_tx.send(());
            if let Err(e) = task.handle.await {
                warn!(error = %e, "liveness task ended abnormally");
            }
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Port of the running governance process
    pub fn port(&self) -> Option<u16> {
        self.lifecycle.port()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &GuardianConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<InterceptorRegistry> {
        &self.registry
    }

    pub fn pid(&self) -> Option<u32> {
        self.supervisor.pid()
    }

    /// Route bound to this controller's lifecycle
    ///
    /// The route passes everything through until the controller is `Ready`.
    pub fn route(&self) -> GuardianRoute {
        GuardianRoute::new(
            format!("guardian:{}", self.config.service_name),
            Arc::clone(&self.lifecycle),
            InterceptionRule::default(),
        )
    }

    /// Inbound forwarding middleware state for axum hosts
    pub fn forwarder(&self) -> Result<GuardianForwarder> {
        GuardianForwarder::new(self.route(), &self.config.forwarding)
    }
}

impl Drop for GuardianController {
    fn drop(&mut self) {
        if let Some(mut guard) = self.guard.take() {
            guard.release();
        }
        if let Some(task) = self.liveness.take() {
            let _ = task.shutdown_tx.send(());
            task.handle.abort();
        }
        // ProcessSupervisor's own Drop kills the child
    }
}
