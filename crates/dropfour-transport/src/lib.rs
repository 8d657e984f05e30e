//! WebSocket transport for Dropfour.
//!
//! One [`WsListener`] accepts connections; each [`WsConnection`] is a
//! persistent byte stream the dispatcher reads from while the server
//! pushes unsolicited messages the other way. The read and write
//! halves are locked independently, so a connection can sit in a
//! blocking receive while outbound notifications flow through.

mod error;
mod websocket;

pub use error::TransportError;
pub use websocket::{WsConnection, WsListener};

use std::fmt;

/// Opaque identifier for a connection, unique for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}
