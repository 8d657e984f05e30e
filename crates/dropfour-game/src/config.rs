//! Session configuration and phase machine.

use std::time::Duration;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Tunable policy for a game session.
///
/// One `SessionConfig` is shared by every session the server spawns;
/// the per-game turn duration is chosen by the host at creation time
/// and lives on the session itself, not here.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Turn duration applied when the host does not pick one.
    pub default_turn_seconds: u32,

    /// Back-to-back expired turns (no accepted move in between) that
    /// force the game into an inactivity draw.
    pub max_consecutive_timeouts: u32,

    /// Pause before a bot move is applied, so the bot's reply does not
    /// land in the same instant as the human's move.
    pub bot_move_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_turn_seconds: 30,
            max_consecutive_timeouts: 2,
            bot_move_delay: Duration::from_secs(1),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionPhase
// ---------------------------------------------------------------------------

/// The lifecycle phase of a game session.
///
/// ```text
/// InProgress → {Won, Drawn, Abandoned}
/// ```
///
/// - **InProgress**: the board is live and a participant is on the
///   clock (or a bot move is pending).
/// - **Won**: one side connected four. Terminal for the board, but the
///   session stays registered so the players can negotiate a rematch.
/// - **Drawn**: board filled with no winner, or the inactivity limit
///   was reached. Rematch is still available.
/// - **Abandoned**: a participant left or disconnected mid-game. No
///   rematch from here; the session is unregistered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    InProgress,
    Won,
    Drawn,
    Abandoned,
}

impl SessionPhase {
    /// Returns `true` once the game can no longer accept moves.
    pub fn is_finished(&self) -> bool {
        !matches!(self, Self::InProgress)
    }

    /// Returns `true` if the session ended with a result the players
    /// may want to replay (win or draw, not abandonment).
    pub fn is_rematchable(&self) -> bool {
        matches!(self, Self::Won | Self::Drawn)
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InProgress => write!(f, "InProgress"),
            Self::Won => write!(f, "Won"),
            Self::Drawn => write!(f, "Drawn"),
            Self::Abandoned => write!(f, "Abandoned"),
        }
    }
}
