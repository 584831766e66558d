//! Local networking helpers

pub mod port;

pub use port::PortAllocator;
