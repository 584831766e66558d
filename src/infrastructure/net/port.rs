use std::net::{Ipv4Addr, TcpListener};
use tracing::debug;

use crate::domain::error::{GuardianError, Result};

/// Reserves ephemeral local TCP ports
///
/// The port is released as soon as it has been read, so another process may
/// grab it before the governance process binds. That window is accepted and
/// surfaces as a readiness timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct PortAllocator;

impl PortAllocator {
    pub const fn new() -> Self {
        Self
    }

    /// Ask the OS for an unused port on the loopback interface
    pub fn reserve(&self) -> Result<u16> {
        let listener =
            TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).map_err(GuardianError::PortAllocation)?;
        let port = listener
            .local_addr()
            .map_err(GuardianError::PortAllocation)?
            .port();
        drop(listener);

        debug!(port, "reserved ephemeral port");
        Ok(port)
    }

    /// Use `preferred` when set, otherwise reserve an ephemeral port
    pub fn reserve_or(&self, preferred: Option<u16>) -> Result<u16> {
        match preferred {
            Some(port) => Ok(port),
            None => self.reserve(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_port_is_bindable() {
        let port = PortAllocator::new().reserve().unwrap();
        assert_ne!(port, 0);
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, port));
        assert!(listener.is_ok(), "reserved port should be free again");
    }

    #[test]
    fn test_preferred_port_is_used_verbatim() {
        let allocator = PortAllocator::new();
        assert_eq!(allocator.reserve_or(Some(4815)).unwrap(), 4815);
        assert_ne!(allocator.reserve_or(None).unwrap(), 0);
    }
}
