use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, trace};

use crate::domain::error::{GuardianError, Result};
use crate::domain::models::ReadinessConfig;

/// Health endpoint exposed by the governance process
pub const HEALTH_PATH: &str = "/_guardian/health";

/// Build the health URL for a governance process listening on `port`
pub fn health_url(port: u16) -> String {
    format!("http://localhost:{port}{HEALTH_PATH}")
}

/// Polls the governance health endpoint until it answers 200
///
/// Connection errors and non-200 responses count as "not yet ready" and are
/// not reported while polling. Only exhausting the overall timeout is an
/// error.
#[derive(Debug, Clone)]
pub struct ReadinessProber {
    client: Client,
    poll_interval: Duration,
    probe_timeout: Duration,
}

impl ReadinessProber {
    pub fn new(config: &ReadinessConfig) -> Result<Self> {
        Self::with_timings(config.poll_interval(), config.probe_timeout())
    }

    pub fn with_timings(poll_interval: Duration, probe_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .no_proxy()
            .tcp_nodelay(true)
            .build()?;

        Ok(Self {
            client,
            poll_interval,
            probe_timeout,
        })
    }

    /// Issue a single health probe
    pub async fn probe(&self, port: u16) -> bool {
        match self
            .client
            .get(health_url(port))
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) if response.status() == StatusCode::OK => true,
            Ok(response) => {
                trace!(port, status = %response.status(), "health probe not ready");
                false
            }
            Err(e) => {
                trace!(port, error = %e, "health probe failed");
                false
            }
        }
    }

    /// Wait until the process on `port` is ready or `timeout` elapses
    pub async fn wait_until_ready(&self, port: u16, timeout: Duration) -> Result<()> {
        self.wait_until_ready_while(port, timeout, || Ok(())).await
    }

    /// Like [`wait_until_ready`](Self::wait_until_ready), but calls
    /// `still_alive` before each probe so a crashed child fails fast
    pub async fn wait_until_ready_while<F>(
        &self,
        port: u16,
        timeout: Duration,
        mut still_alive: F,
    ) -> Result<()>
    where
        F: FnMut() -> Result<()> + Send,
    {
        let started = Instant::now();
        let deadline = started + timeout;
        let mut attempts: u32 = 0;

        debug!(port, timeout_ms = timeout.as_millis(), "waiting for Guardian readiness");

        loop {
            still_alive()?;
            attempts += 1;

            if self.probe(port).await {
                info!(
                    port,
                    attempts,
                    elapsed_ms = started.elapsed().as_millis(),
                    "Guardian proxy is ready"
                );
                return Ok(());
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(GuardianError::ReadinessTimeout { port, timeout });
            }
            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }
    }
}
