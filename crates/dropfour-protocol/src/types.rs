//! Message types for the Dropfour wire format.
//!
//! Every enum that crosses the wire is internally tagged
//! (`#[serde(tag = "type")]`), so a `ClientMessage::Move` serializes
//! as `{ "type": "Move", "column": 3 }` — easy to produce and inspect
//! from any client.

use dropfour_engine::Difficulty;
use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a connected human participant.
///
/// Newtype over `u64`; `#[serde(transparent)]` keeps the wire form a
/// plain number. Bots are *not* `PlayerId`s — a synthetic opponent is
/// the [`Opponent::Bot`] variant, so there is no reserved or
/// sign-encoded identifier space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for a game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub u64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Opponent — who sits across the board
// ---------------------------------------------------------------------------

/// The second participant of a session: a connected human or a
/// server-driven bot of a given difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Opponent {
    /// Another connected player.
    Human { player: PlayerId },
    /// A synthetic opponent resolved by the bot policies.
    Bot { difficulty: Difficulty },
}

impl Opponent {
    /// The human's id, if this opponent is human.
    pub fn player_id(&self) -> Option<PlayerId> {
        match self {
            Opponent::Human { player } => Some(*player),
            Opponent::Bot { .. } => None,
        }
    }

    /// Returns `true` for a synthetic opponent.
    pub fn is_bot(&self) -> bool {
        matches!(self, Opponent::Bot { .. })
    }
}

impl fmt::Display for Opponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Opponent::Human { player } => write!(f, "{player}"),
            Opponent::Bot { difficulty } => write!(f, "bot ({difficulty})"),
        }
    }
}

// ---------------------------------------------------------------------------
// Recipient — who should receive a session message
// ---------------------------------------------------------------------------

/// Where the session actor wants an outbound message delivered.
/// A session has at most two human participants, so this is simpler
/// than a general broadcast scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every human participant of the session.
    Both,
    /// One specific participant.
    Player(PlayerId),
}

// ---------------------------------------------------------------------------
// Outcome — how a game ended, from one player's perspective
// ---------------------------------------------------------------------------

/// The result a single participant is told when their game ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Loss,
    Draw,
    /// Forced draw after too many consecutive turn timeouts.
    InactivityDraw,
}

impl Outcome {
    /// `true` for either draw form.
    pub fn is_draw(&self) -> bool {
        matches!(self, Outcome::Draw | Outcome::InactivityDraw)
    }
}

/// The exact phrases clients display, kept from the original protocol.
impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Win => write!(f, "You win!"),
            Outcome::Loss => write!(f, "You lose!"),
            Outcome::Draw => write!(f, "Draw!"),
            Outcome::InactivityDraw => {
                write!(f, "Game ended in a draw due to inactivity.")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Open-game listing
// ---------------------------------------------------------------------------

/// One entry of the open-games list: a host waiting in the queue and
/// the turn duration they asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenGame {
    pub host: PlayerId,
    pub turn_seconds: u32,
}

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// Everything a client may send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Queue up as a host, waiting for an opponent. `turn_seconds` is
    /// the per-turn time limit the resulting game will use.
    CreateGame { turn_seconds: u32 },

    /// Start a game against a bot immediately, bypassing the queue.
    CreateBotGame {
        difficulty: Difficulty,
        turn_seconds: u32,
    },

    /// Ask for the list of open games.
    RequestGames,

    /// Join the oldest open game (FIFO — there is no skill matching).
    JoinGame,

    /// Drop a disc into `column` (0-based).
    Move { column: usize },

    /// Request a rematch of the caller's most recent finished game.
    Rematch,

    /// Leave the current game and return to the lobby.
    ReturnToLobby,

    /// Withdraw a pending CreateGame from the queue.
    CancelGameCreation,
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Everything the server may send. The server pushes unsolicited
/// messages at any time (opponent moves, timer expiries), so clients
/// must treat the stream as asymmetric rather than request/response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// First message on every connection: the id the server assigned.
    Welcome { player: PlayerId },

    /// CreateGame accepted; the caller is now waiting in the queue.
    GameCreated,

    /// Response to RequestGames.
    GameList { games: Vec<OpenGame> },

    /// JoinGame found the queue empty.
    NoGamesAvailable,

    /// A session started. Each participant is told who they face and
    /// the agreed turn duration.
    GameStarted {
        opponent: Opponent,
        turn_seconds: u32,
    },

    /// Full board state: row-major digits, rows comma-separated.
    BoardUpdate { board: String },

    /// Whose turn it now is.
    Turn { player: PlayerId },

    /// Seconds available for the turn that just started.
    TimerUpdate { seconds_remaining: u32 },

    /// Sent to a player whose turn was forfeited by timeout.
    TurnSkipped,

    /// The game ended; the outcome is from the recipient's perspective.
    GameOver { outcome: Outcome },

    /// Rematch recorded; waiting for the opponent to request one too.
    RematchWaiting,

    /// The opponent left the game (lobby return or disconnect).
    OpponentLeft,

    /// CancelGameCreation removed the caller's queue entry.
    CreationCancelled,

    /// CancelGameCreation found no queue entry for the caller.
    NotInQueue,

    /// A request failed; only the offending connection is told.
    Error { message: String },
}

// =========================================================================
// Tests
// =========================================================================
