//! # Dropfour
//!
//! Server-authoritative Connect Four backend over WebSockets.
//!
//! The server owns all game state: clients only describe intent (drop
//! a disc in column 3, join the oldest open game) and render what the
//! server tells them. Each game runs as its own Tokio task, matched up
//! from a FIFO lobby queue or against a built-in bot.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dropfour::{DropfourServer, MemoryStats};
//!
//! # async fn run() -> Result<(), dropfour::DropfourError> {
//! let server = DropfourServer::<MemoryStats>::builder()
//!     .bind("0.0.0.0:8080")
//!     .build(MemoryStats::new())
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;
mod stats;

pub use error::DropfourError;
pub use server::{DropfourServer, DropfourServerBuilder};
pub use stats::{MemoryStats, NullStats, PlayerStats, StatsSink};
