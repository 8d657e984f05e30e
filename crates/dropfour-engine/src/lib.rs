//! Game rules for Dropfour: the board engine and the bot policies.
//!
//! Everything in this crate is pure — no I/O, no tasks, no clocks.
//! The session layer owns a [`Board`], applies moves to it, and asks
//! it about wins and draws; the bot policies read a board snapshot and
//! return a column.
//!
//! # Key types
//!
//! - [`Board`] — the 6×7 grid with gravity, win and draw detection
//! - [`Mark`] — which player a disc belongs to
//! - [`Difficulty`] — which bot policy to run
//! - [`bot::choose_move`] — the bot entry point

mod board;
pub mod bot;

pub use board::{Board, Mark, COLS, ROWS};
pub use bot::Difficulty;
