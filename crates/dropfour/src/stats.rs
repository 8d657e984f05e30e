//! Result recording behind a pluggable sink.
//!
//! Durable leaderboard storage lives outside this server; the [`StatsSink`]
//! trait is the seam where a deployment plugs its own persistence in.
//! [`MemoryStats`] is the in-process default (and what the integration
//! tests inspect).

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use dropfour_protocol::{Outcome, PlayerId};
use tokio::sync::Mutex;

/// Receives one `(player, outcome)` pair per human participant of every
/// finished game.
///
/// The returned future must be `Send`: recording runs on a background
/// task shared by all sessions.
pub trait StatsSink: Send + Sync + 'static {
    fn record(
        &self,
        player: PlayerId,
        outcome: Outcome,
    ) -> impl Future<Output = ()> + Send;
}

/// Discards every result.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStats;

impl StatsSink for NullStats {
    async fn record(&self, _player: PlayerId, _outcome: Outcome) {}
}

/// A player's running tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerStats {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

/// Keeps per-player tallies in memory for the process lifetime.
/// Cheap to clone; all clones share one table.
#[derive(Debug, Clone, Default)]
pub struct MemoryStats {
    table: Arc<Mutex<HashMap<PlayerId, PlayerStats>>>,
}

impl MemoryStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// The tally for one player, zeroed if they never finished a game.
    pub async fn stats_for(&self, player: PlayerId) -> PlayerStats {
        self.table
            .lock()
            .await
            .get(&player)
            .copied()
            .unwrap_or_default()
    }
}

impl StatsSink for MemoryStats {
    async fn record(&self, player: PlayerId, outcome: Outcome) {
        let mut table = self.table.lock().await;
        let entry = table.entry(player).or_default();
        match outcome {
            Outcome::Win => entry.wins += 1,
            Outcome::Loss => entry.losses += 1,
            Outcome::Draw | Outcome::InactivityDraw => entry.draws += 1,
        }
        tracing::debug!(
            %player,
            %outcome,
            wins = entry.wins,
            losses = entry.losses,
            draws = entry.draws,
            "result recorded"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_stats_tallies_outcomes() {
        let stats = MemoryStats::new();
        stats.record(PlayerId(1), Outcome::Win).await;
        stats.record(PlayerId(1), Outcome::Win).await;
        stats.record(PlayerId(1), Outcome::Loss).await;
        stats.record(PlayerId(1), Outcome::InactivityDraw).await;

        let tally = stats.stats_for(PlayerId(1)).await;
        assert_eq!(tally, PlayerStats { wins: 2, losses: 1, draws: 1 });
    }

    #[tokio::test]
    async fn test_memory_stats_unknown_player_is_zeroed() {
        let stats = MemoryStats::new();
        assert_eq!(stats.stats_for(PlayerId(9)).await, PlayerStats::default());
    }

    #[tokio::test]
    async fn test_memory_stats_clones_share_the_table() {
        let stats = MemoryStats::new();
        let clone = stats.clone();
        clone.record(PlayerId(2), Outcome::Draw).await;
        assert_eq!(stats.stats_for(PlayerId(2)).await.draws, 1);
    }
}
