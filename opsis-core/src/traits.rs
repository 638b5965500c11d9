//! Collaborator traits for the outer loop
//!
//! The network association, broker connection, and device platform are
//! external collaborators. The core only needs a readiness signal, a
//! message pump, and a way back to a clean boot.

use core::fmt;

/// Message-bus connection
pub trait BrokerLink {
    type Error: fmt::Debug + fmt::Display;

    /// True while the broker session is alive
    fn is_connected(&self) -> bool;

    /// Attempt one connection with the given client id
    fn connect(&mut self, client_id: &str) -> Result<(), Self::Error>;

    /// Subscribe to one topic on the live session
    fn subscribe(&mut self, topic: &str) -> Result<(), Self::Error>;

    /// Deliver pending inbound messages, one `sink(topic, payload)` call
    /// per message, in arrival order, synchronously
    fn service(&mut self, sink: &mut dyn FnMut(&str, &[u8])) -> Result<(), Self::Error>;
}

/// Network association status
pub trait NetworkLink {
    /// True while the underlying association is up
    fn is_up(&self) -> bool;

    /// Local address, for diagnostics only
    fn local_addr(&self) -> Option<core::net::Ipv4Addr>;
}

/// Device-level services: delays and the restart escape hatch
pub trait Platform {
    /// Block the single thread of control for `ms` milliseconds
    fn sleep_ms(&mut self, ms: u32);

    /// Full device restart. Network loss is unrecoverable at this layer;
    /// the process re-enters initialization from scratch. On hardware this
    /// call never returns; test doubles record it and do.
    fn restart(&mut self);
}
