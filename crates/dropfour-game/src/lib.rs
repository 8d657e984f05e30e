//! Matchmaking, game sessions, and rematch pairing for Dropfour.
//!
//! Each game session runs as an isolated Tokio task (actor model)
//! owning its board, seats, and timers, so a move arriving while a
//! turn expires is linearized instead of racing.
//!
//! # Key types
//!
//! - [`SessionRegistry`] — spawns/destroys sessions, routes players
//! - [`SessionHandle`] — send commands to a running session actor
//! - [`Matchmaker`] — FIFO queue of hosts waiting for an opponent
//! - [`RematchCoordinator`] — pairs two rematch requests
//! - [`SessionConfig`] / [`SessionPhase`] — policy and lifecycle

mod config;
mod error;
mod matchmaker;
mod registry;
mod rematch;
mod session;

pub use config::{SessionConfig, SessionPhase};
pub use error::GameError;
pub use matchmaker::{Matchmaker, QueueEntry};
pub use registry::SessionRegistry;
pub use rematch::{RematchCoordinator, RematchOutcome};
pub use session::{
    spawn_session, HumanSeat, MatchResult, OpponentSeat, OutboundSender,
    SessionHandle, SessionInfo,
};
