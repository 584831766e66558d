//! Interceptor registry
//!
//! A dispatch table of request interceptors keyed by controller id. Hosts opt
//! in by sending requests through a [`GuardedClient`](super::GuardedClient)
//! bound to a registry. Entries are consulted in registration order and the
//! first interceptor that claims a request wins.

use reqwest::Request;
use std::sync::{Arc, OnceLock, PoisonError, RwLock, Weak};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::ports::{RequestInterceptor, Reroute};

struct RegistryEntry {
    id: Uuid,
    interceptor: Arc<dyn RequestInterceptor>,
}

/// Ordered set of installed interceptors
///
/// Install and uninstall take the write lock; every request takes the read
/// lock for the duration of its rewrite, so a request never observes a
/// half-updated table.
#[derive(Default)]
pub struct InterceptorRegistry {
    entries: RwLock<Vec<RegistryEntry>>,
}

static SHARED_REGISTRY: OnceLock<Arc<InterceptorRegistry>> = OnceLock::new();

impl InterceptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry used by default controllers and clients
    pub fn shared() -> Arc<Self> {
        SHARED_REGISTRY
            .get_or_init(|| Arc::new(Self::new()))
            .clone()
    }

    /// Install `interceptor` under `id`
    ///
    /// Returns `None` when `id` already has an entry; the existing entry is
    /// left in place. Dropping the returned guard uninstalls the entry.
    pub fn install(
        self: &Arc<Self>,
        id: Uuid,
        interceptor: Arc<dyn RequestInterceptor>,
    ) -> Option<InterceptionGuard> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.iter().any(|entry| entry.id == id) {
            debug!(%id, "interceptor already installed");
            return None;
        }

        info!(%id, interceptor = interceptor.name(), position = entries.len(), "installed interceptor");
        entries.push(RegistryEntry { id, interceptor });

        Some(InterceptionGuard {
            registry: Arc::downgrade(self),
            id,
            released: false,
        })
    }

    /// Remove the entry for `id`; returns false when nothing was installed
    pub fn uninstall(&self, id: Uuid) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        let removed = entries.len() != before;
        if removed {
            info!(%id, "uninstalled interceptor");
        }
        removed
    }

    pub fn is_installed(&self, id: Uuid) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Let the first claiming interceptor rewrite `request`
    pub fn apply(&self, request: &mut Request) -> Option<Reroute> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .iter()
            .find_map(|entry| entry.interceptor.rewrite(request))
    }
}

/// Keeps an interceptor installed for as long as it lives
pub struct InterceptionGuard {
    registry: Weak<InterceptorRegistry>,
    id: Uuid,
    released: bool,
}

impl InterceptionGuard {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Uninstall now instead of on drop
    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.uninstall(self.id))
    }
}

impl Drop for InterceptionGuard {
    fn drop(&mut self) {
        self.release();
    }
}
