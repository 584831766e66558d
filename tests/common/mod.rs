//! Common test utilities for integration tests
//!
//! Provides shared fixtures and helpers for driving a controller against the
//! `guardian-stub` contract binary.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use guardian_shim::{GuardianConfig, GuardianController, InterceptorRegistry};

/// Path of the contract stub built alongside the tests
pub fn stub_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_guardian-stub"))
}

/// Config that launches the contract stub with test-friendly timings
pub fn stub_config(service: &str) -> GuardianConfig {
    let mut config = GuardianConfig::for_service(service);
    config.binary_path = Some(stub_binary());
    config.readiness.timeout_ms = 10_000;
    config.readiness.poll_interval_ms = 20;
    config.readiness.probe_timeout_ms = 250;
    config.readiness.terminate_grace_ms = 2_000;
    config
}

/// Controller bound to its own registry so tests do not share routes
pub fn isolated_controller(config: GuardianConfig) -> (GuardianController, Arc<InterceptorRegistry>) {
    let registry = Arc::new(InterceptorRegistry::new());
    let controller = GuardianController::with_registry(config, Arc::clone(&registry))
        .expect("Failed to create controller");
    (controller, registry)
}

/// Plain client that bypasses any proxy configured in the environment
pub fn direct_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("Failed to build client")
}

/// Write an executable shell script standing in for the Guardian binary
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("Failed to write script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("Failed to chmod script");
    path
}

/// True while a process with `pid` exists and is not a zombie
#[cfg(unix)]
pub fn process_alive(pid: u32) -> bool {
    if let Ok(stat) = std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        return stat
            .rsplit_once(')')
            .map_or(true, |(_, rest)| !rest.trim_start().starts_with('Z'));
    }
    let pid = nix::unistd::Pid::from_raw(i32::try_from(pid).expect("pid fits in i32"));
    nix::sys::signal::kill(pid, None).is_ok()
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Wait for a condition to be true with timeout
///
/// Polls the predicate every 20ms until it returns true or timeout is reached.
pub async fn wait_for<F>(mut predicate: F, timeout: Duration) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    predicate()
}
