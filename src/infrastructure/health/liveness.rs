use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::prober::ReadinessProber;
use crate::domain::models::{LivenessConfig, SharedLifecycle};

/// Liveness monitor for a ready governance process
///
/// Probes the health endpoint on a fixed interval. After `max_failures`
/// consecutive failures the shared lifecycle is marked unhealthy, which turns
/// interception into pass-through until a probe succeeds again.
///
/// # Example
///
/// ```rust,no_run
/// use guardian_shim::domain::models::{LivenessConfig, SharedLifecycle};
/// use guardian_shim::infrastructure::health::{LivenessMonitor, ReadinessProber};
/// use std::sync::Arc;
/// use std::time::Duration;
/// use tokio::sync::broadcast;
///
/// # async fn example() -> anyhow::Result<()> {
/// let prober = ReadinessProber::with_timings(Duration::from_millis(100), Duration::from_millis(500))?;
/// let lifecycle = Arc::new(SharedLifecycle::new());
/// let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
///
/// let monitor = LivenessMonitor::new(prober, lifecycle, &LivenessConfig::default());
/// let handle = monitor.start_monitoring(4100, shutdown_rx);
///
/// shutdown_tx.send(()).ok();
/// handle.await?;
/// # Ok(())
/// # }
/// ```
pub struct LivenessMonitor {
    prober: ReadinessProber,
    lifecycle: Arc<SharedLifecycle>,
    check_interval: Duration,
    max_failures: u32,
}

impl LivenessMonitor {
    pub fn new(
        prober: ReadinessProber,
        lifecycle: Arc<SharedLifecycle>,
        config: &LivenessConfig,
    ) -> Self {
        Self {
            prober,
            lifecycle,
            check_interval: config.interval(),
            max_failures: config.max_failures.max(1),
        }
    }

    /// Spawn the background monitoring task for the process on `port`
    ///
    /// Returns a `JoinHandle` that completes once a shutdown signal arrives.
    pub fn start_monitoring(
        self,
        port: u16,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut consecutive_failures: u32 = 0;
            let mut interval = tokio::time::interval(self.check_interval);

            // Skip first tick (fires immediately)
            interval.tick().await;

            tracing::info!(
                port,
                check_interval_ms = self.check_interval.as_millis(),
                max_failures = self.max_failures,
                "Started Guardian liveness monitoring"
            );

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if self.prober.probe(port).await {
                            if consecutive_failures > 0 {
                                tracing::info!(
                                    port,
                                    "Liveness recovered after {} failures",
                                    consecutive_failures
                                );
                            }
                            consecutive_failures = 0;
                            if !self.lifecycle.is_healthy() {
                                self.lifecycle.set_healthy(true);
                                tracing::info!(port, "Guardian healthy again, resuming interception");
                            }
                        } else {
                            consecutive_failures = consecutive_failures.saturating_add(1);
                            tracing::warn!(
                                port,
                                consecutive_failures,
                                max_failures = self.max_failures,
                                "Guardian liveness check failed"
                            );

                            if consecutive_failures >= self.max_failures && self.lifecycle.is_healthy() {
                                self.lifecycle.set_healthy(false);
                                tracing::error!(
                                    port,
                                    consecutive_failures,
                                    "Guardian unreachable, interception degraded to pass-through"
                                );
                            }
                        }
                    }

                    _ = shutdown_rx.recv() => {
                        tracing::debug!(port, "Received shutdown signal, stopping liveness monitoring");
                        break;
                    }
                }
            }

            tracing::info!(port, "Liveness monitoring stopped");
        })
    }
}
