//! Command-line launcher
//!
//! Loads configuration, starts a controller, and keeps the governance proxy
//! alive until the process is asked to shut down.

pub mod types;

pub use types::Cli;

use anyhow::{Context, Result};
use tracing::info;

use crate::application::GuardianController;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::logging::{LogConfig, LoggerImpl};

/// Run the launcher until Ctrl-C or SIGTERM
pub async fn run(cli: Cli) -> Result<()> {
    let mut config = match cli.config {
        Some(ref path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    cli.apply(&mut config);
    ConfigLoader::validate(&config)?;

    let _logger = LoggerImpl::init(&LogConfig::from_settings(&config.logging, config.debug))
        .context("Failed to initialize logging")?;

    let mut controller = GuardianController::new(config)?;
    controller
        .start()
        .await
        .context("Failed to start Guardian")?;

    if let Some(port) = controller.port() {
        println!("{port}");
    }

    shutdown_signal().await;
    info!("Shutdown signal received");

    controller.stop().await.context("Failed to stop Guardian")?;
    Ok(())
}

/// Resolve once Ctrl-C (or SIGTERM on unix) arrives
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
