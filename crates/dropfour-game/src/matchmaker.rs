//! Matchmaking queue: hosts waiting for an opponent, oldest first.

use std::collections::VecDeque;

use dropfour_protocol::{OpenGame, PlayerId};

use crate::{GameError, HumanSeat};

/// One waiting host and the turn duration their game will use.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub host: HumanSeat,
    pub turn_seconds: u32,
}

/// FIFO queue of open games.
///
/// There is no skill matching: a joiner always gets the host that has
/// waited longest, and the host's requested turn duration wins.
#[derive(Debug, Default)]
pub struct Matchmaker {
    queue: VecDeque<QueueEntry>,
}

impl Matchmaker {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a host to the back of the queue.
    ///
    /// Idempotency is not enforced: a host that creates twice is queued
    /// twice, and each entry is matched (or cancelled) independently.
    pub fn enqueue(&mut self, host: HumanSeat, turn_seconds: u32) {
        tracing::debug!(
            host = %host.player,
            turn_seconds,
            waiting = self.queue.len() + 1,
            "host queued"
        );
        self.queue.push_back(QueueEntry { host, turn_seconds });
    }

    /// Removes and returns the oldest entry, or `None` if the queue is
    /// empty. The joiner must not match against themselves, so their
    /// own entries (if any) are skipped.
    pub fn take_oldest(&mut self, joiner: PlayerId) -> Option<QueueEntry> {
        let idx = self
            .queue
            .iter()
            .position(|entry| entry.host.player != joiner)?;
        self.queue.remove(idx)
    }

    /// Withdraws a host's oldest pending entry.
    pub fn cancel(&mut self, player: PlayerId) -> Result<(), GameError> {
        let idx = self
            .queue
            .iter()
            .position(|entry| entry.host.player == player)
            .ok_or(GameError::NotInQueue(player))?;
        self.queue.remove(idx);
        tracing::debug!(host = %player, "queue entry cancelled");
        Ok(())
    }

    /// Whether this player currently has an open game.
    pub fn contains(&self, player: PlayerId) -> bool {
        self.queue.iter().any(|entry| entry.host.player == player)
    }

    /// The current open games, oldest first, for the lobby listing.
    pub fn open_games(&self) -> Vec<OpenGame> {
        self.queue
            .iter()
            .map(|entry| OpenGame {
                host: entry.host.player,
                turn_seconds: entry.turn_seconds,
            })
            .collect()
    }

    /// Number of waiting hosts.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether no host is waiting.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn seat(id: u64) -> HumanSeat {
        let (tx, _rx) = mpsc::unbounded_channel();
        HumanSeat { player: PlayerId(id), sender: tx }
    }

    #[test]
    fn test_fifo_pairing_uses_hosts_turn_duration() {
        let mut mm = Matchmaker::new();
        mm.enqueue(seat(1), 30);
        mm.enqueue(seat(2), 15);

        // P3 joins: paired with P1 (oldest), turn duration 30s.
        let entry = mm.take_oldest(PlayerId(3)).unwrap();
        assert_eq!(entry.host.player, PlayerId(1));
        assert_eq!(entry.turn_seconds, 30);

        // Only P2 remains.
        assert_eq!(mm.len(), 1);
        assert!(mm.contains(PlayerId(2)));
        assert!(!mm.contains(PlayerId(1)));
    }

    #[test]
    fn test_take_oldest_on_empty_queue() {
        let mut mm = Matchmaker::new();
        assert!(mm.take_oldest(PlayerId(1)).is_none());
    }

    #[test]
    fn test_joiner_never_matches_their_own_entry() {
        let mut mm = Matchmaker::new();
        mm.enqueue(seat(1), 30);
        mm.enqueue(seat(2), 15);

        let entry = mm.take_oldest(PlayerId(1)).unwrap();
        assert_eq!(entry.host.player, PlayerId(2));
        // P1's own entry is still queued.
        assert!(mm.contains(PlayerId(1)));
    }

    #[test]
    fn test_double_enqueue_adds_second_entry() {
        // Creating twice queues twice; each entry stands on its own.
        let mut mm = Matchmaker::new();
        mm.enqueue(seat(1), 30);
        mm.enqueue(seat(1), 15);
        assert_eq!(mm.len(), 2);

        let entry = mm.take_oldest(PlayerId(2)).unwrap();
        assert_eq!(entry.host.player, PlayerId(1));
        assert_eq!(entry.turn_seconds, 30);
        // The second entry is still open.
        assert!(mm.contains(PlayerId(1)));
    }

    #[test]
    fn test_cancel_removes_entry() {
        let mut mm = Matchmaker::new();
        mm.enqueue(seat(1), 30);
        mm.enqueue(seat(2), 15);

        mm.cancel(PlayerId(1)).unwrap();
        assert!(!mm.contains(PlayerId(1)));
        assert_eq!(mm.take_oldest(PlayerId(9)).unwrap().host.player, PlayerId(2));
    }

    #[test]
    fn test_cancel_without_entry_fails() {
        let mut mm = Matchmaker::new();
        let err = mm.cancel(PlayerId(5)).unwrap_err();
        assert!(matches!(err, GameError::NotInQueue(p) if p == PlayerId(5)));
    }

    #[test]
    fn test_open_games_listing_preserves_order() {
        let mut mm = Matchmaker::new();
        assert!(mm.is_empty());
        mm.enqueue(seat(4), 60);
        mm.enqueue(seat(7), 20);

        let games = mm.open_games();
        assert_eq!(games.len(), 2);
        assert_eq!(games[0], OpenGame { host: PlayerId(4), turn_seconds: 60 });
        assert_eq!(games[1], OpenGame { host: PlayerId(7), turn_seconds: 20 });
    }
}
