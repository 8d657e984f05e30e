//! Cancellable turn countdown for Dropfour sessions.
//!
//! A [`TurnTimer`] is bound to one session and armed once per turn.
//! It is designed to sit inside a session actor's `tokio::select!`
//! loop, next to the command channel:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = rx.recv() => { /* moves, leaves */ }
//!         generation = turn_timer.wait() => {
//!             session.handle_timeout(generation);
//!         }
//!     }
//! }
//! ```
//!
//! Because expiry is just another branch of the same loop, a move and
//! a timeout on one session can never interleave — they are linearized
//! by the actor, which is the whole point of the design.
//!
//! # Contract
//!
//! - Arming implicitly disarms any prior arming (re-arm is idempotent).
//! - Disarming is unconditional and side-effect-free when idle.
//! - [`wait`](TurnTimer::wait) pends forever while disarmed, and
//!   resolves **at most once per arming** — the timer disarms itself
//!   as it fires.
//! - Every arming gets a fresh generation number, and disarming bumps
//!   it too. A caller that stashed a generation can always tell a
//!   current expiry from a stale one, so a disarm racing an in-flight
//!   expiry is detectable (last write wins, never double delivery).

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::trace;

/// A repeating-use, single-fire-per-arming countdown.
///
/// One `TurnTimer` per session per purpose (turn limit, bot pacing).
/// All methods are synchronous except [`wait`](TurnTimer::wait).
#[derive(Debug, Default)]
pub struct TurnTimer {
    /// When the current arming expires. `None` means disarmed.
    deadline: Option<Instant>,
    /// Bumped on every arm *and* disarm.
    generation: u64,
}

impl TurnTimer {
    /// Creates a disarmed timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the timer for `duration` from now, replacing any prior
    /// arming, and returns the new arming's generation.
    pub fn arm(&mut self, duration: Duration) -> u64 {
        self.generation += 1;
        self.deadline = Some(Instant::now() + duration);
        trace!(
            generation = self.generation,
            secs = duration.as_secs(),
            "turn timer armed"
        );
        self.generation
    }

    /// Disarms the timer. Safe to call at any time, including when the
    /// timer is already idle or its expiry has already fired.
    pub fn disarm(&mut self) {
        if self.deadline.take().is_some() {
            self.generation += 1;
            trace!(generation = self.generation, "turn timer disarmed");
        }
    }

    /// Whether an arming is currently counting down.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// The generation of the most recent arming or disarming.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Time left on the current arming, or `None` while disarmed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Resolves when the current arming expires, returning its
    /// generation; pends forever while disarmed.
    ///
    /// The timer disarms itself as it fires, so an arming produces at
    /// most one expiry. Cancellation-safe: if the enclosing `select!`
    /// picks another branch first, the arming stays intact and the
    /// next call picks it up again.
    pub async fn wait(&mut self) -> u64 {
        let Some(deadline) = self.deadline else {
            // Disarmed: pend forever so select! only sees other branches.
            std::future::pending::<()>().await;
            unreachable!()
        };
        time::sleep_until(deadline).await;
        self.deadline = None;
        trace!(generation = self.generation, "turn timer expired");
        self.generation
    }
}
