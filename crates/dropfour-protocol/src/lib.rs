//! Wire protocol for Dropfour.
//!
//! This crate defines the messages that travel between a game client
//! and the server, and how they become bytes:
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`Opponent`],
//!   identifiers) — the structures on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — the byte conversion.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while encoding
//!   or decoding.
//!
//! The protocol layer knows nothing about connections, sessions, or
//! game rules beyond the vocabulary needed to describe them on the
//! wire (column indices, difficulties, board strings).

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientMessage, GameId, OpenGame, Opponent, Outcome, PlayerId,
    Recipient, ServerMessage,
};
