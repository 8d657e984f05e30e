//! Unified error type for the Dropfour server.

use dropfour_game::GameError;
use dropfour_protocol::ProtocolError;
use dropfour_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum DropfourError {
    /// A transport-level error (connection, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A game-level error (matchmaking, session state).
    #[error(transparent)]
    Game(#[from] GameError),
}
