//! Controller lifecycle state machine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::{PoisonError, RwLock};

use crate::domain::error::GuardianError;

/// Lifecycle of a Guardian controller
///
/// ```text
/// Uninitialized -> Starting -> Ready -> Stopping -> Stopped
///                     |                              |
///                     v                              |
///                   Error  <-- retry via Starting ---+
/// ```
///
/// `Ready` is the only state in which interception is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Uninitialized,
    Starting,
    Ready,
    Stopping,
    Stopped,
    Error,
}

impl LifecycleState {
    /// Check whether a transition to `next` is permitted
    pub const fn can_transition_to(self, next: Self) -> bool {
        use LifecycleState::{Error, Ready, Starting, Stopped, Stopping, Uninitialized};
        matches!(
            (self, next),
            (Uninitialized | Stopped | Error, Starting)
                | (Starting, Ready | Error)
                | (Uninitialized | Starting | Ready | Error, Stopping)
                | (Stopping, Stopped)
        )
    }

    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state shared between a controller and the hooks it installs
///
/// The controller is the only writer. Interception hooks read it on every
/// request, so it also carries the bound port and the liveness verdict.
#[derive(Debug)]
pub struct SharedLifecycle {
    state: RwLock<LifecycleState>,
    port: AtomicU16,
    healthy: AtomicBool,
}

impl SharedLifecycle {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LifecycleState::Uninitialized),
            port: AtomicU16::new(0),
            healthy: AtomicBool::new(true),
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move to `next`, rejecting transitions the state machine does not allow
    pub fn transition(&self, next: LifecycleState) -> Result<LifecycleState, GuardianError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let from = *state;
        if !from.can_transition_to(next) {
            return Err(GuardianError::InvalidTransition { from, to: next });
        }
        *state = next;
        tracing::debug!(from = %from, to = %next, "lifecycle transition");
        Ok(from)
    }

    /// Port the governance process listens on, if one has been assigned
    pub fn port(&self) -> Option<u16> {
        match self.port.load(Ordering::Acquire) {
            0 => None,
            port => Some(port),
        }
    }

    pub fn set_port(&self, port: Option<u16>) {
        self.port.store(port.unwrap_or(0), Ordering::Release);
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Acquire)
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::Release);
    }

    /// True when requests should be rerouted right now
    pub fn is_routing(&self) -> bool {
        self.state().is_ready() && self.is_healthy() && self.port().is_some()
    }
}

impl Default for SharedLifecycle {
    fn default() -> Self {
        Self::new()
    }
}
