//! Error types for the game layer.

use dropfour_protocol::{GameId, PlayerId};

/// Errors that can occur during matchmaking and session operations.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// The session does not exist (already torn down or never created).
    #[error("game {0} not found")]
    NotFound(GameId),

    /// The player is not a participant of this session.
    #[error("player {0} is not in game {1}")]
    NotInGame(PlayerId, GameId),

    /// The player is already in an active session.
    #[error("player {0} is already in game {1}")]
    AlreadyInGame(PlayerId, GameId),

    /// The player has no queue entry to cancel.
    #[error("player {0} has no open game in the queue")]
    NotInQueue(PlayerId),

    /// The session is in a phase that doesn't allow this operation.
    /// For example, requesting a rematch on an abandoned game.
    #[error("invalid session state for this operation: {0}")]
    InvalidState(String),

    /// The session's command channel is full or closed.
    #[error("game {0} is unavailable")]
    Unavailable(GameId),
}
