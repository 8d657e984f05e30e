//! Rematch pairing: two requests against the same finished game.

use std::collections::HashMap;

use dropfour_protocol::{GameId, PlayerId};

use crate::HumanSeat;

/// What a rematch request produced.
pub enum RematchOutcome {
    /// First request for this game; waiting for the opponent.
    Waiting,
    /// Both sides asked. The later requester takes seat one and moves
    /// first in the new game.
    Paired {
        player_one: HumanSeat,
        player_two: HumanSeat,
    },
}

/// Pending rematch requests, keyed by the finished game they replay.
///
/// Bot games never pass through here: a single human against a bot
/// gets their rematch immediately, with nobody to wait for.
#[derive(Debug, Default)]
pub struct RematchCoordinator {
    pending: HashMap<GameId, HumanSeat>,
}

impl RematchCoordinator {
    /// Creates an empty coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a request against `game_id`.
    ///
    /// Pairs when the other participant already asked; a repeated
    /// request from the same player just refreshes their seat and
    /// keeps waiting.
    pub fn request(
        &mut self,
        game_id: GameId,
        seat: HumanSeat,
    ) -> RematchOutcome {
        match self.pending.remove(&game_id) {
            Some(waiting) if waiting.player != seat.player => {
                tracing::info!(
                    %game_id,
                    first = %waiting.player,
                    second = %seat.player,
                    "rematch paired"
                );
                RematchOutcome::Paired {
                    player_one: seat,
                    player_two: waiting,
                }
            }
            _ => {
                tracing::debug!(%game_id, player = %seat.player, "rematch pending");
                self.pending.insert(game_id, seat);
                RematchOutcome::Waiting
            }
        }
    }

    /// Drops any pending request for a game (opponent left, session
    /// torn down). Returns the player who was left waiting, if any.
    pub fn cancel_for_game(&mut self, game_id: GameId) -> Option<PlayerId> {
        self.pending.remove(&game_id).map(|seat| seat.player)
    }

    /// Drops a pending request made by this player, if any.
    pub fn cancel_by_player(&mut self, player: PlayerId) -> Option<GameId> {
        let game_id = self
            .pending
            .iter()
            .find(|(_, seat)| seat.player == player)
            .map(|(game_id, _)| *game_id)?;
        self.pending.remove(&game_id);
        Some(game_id)
    }

    /// Number of games with a pending request.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
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
    fn test_first_request_waits() {
        let mut rc = RematchCoordinator::new();
        assert!(matches!(
            rc.request(GameId(1), seat(10)),
            RematchOutcome::Waiting
        ));
        assert_eq!(rc.pending_count(), 1);
    }

    #[test]
    fn test_second_request_pairs_with_later_requester_first() {
        let mut rc = RematchCoordinator::new();
        rc.request(GameId(1), seat(10));

        match rc.request(GameId(1), seat(20)) {
            RematchOutcome::Paired { player_one, player_two } => {
                assert_eq!(player_one.player, PlayerId(20));
                assert_eq!(player_two.player, PlayerId(10));
            }
            RematchOutcome::Waiting => panic!("expected pairing"),
        }
        assert_eq!(rc.pending_count(), 0);
    }

    #[test]
    fn test_repeated_request_from_same_player_keeps_waiting() {
        let mut rc = RematchCoordinator::new();
        rc.request(GameId(1), seat(10));
        assert!(matches!(
            rc.request(GameId(1), seat(10)),
            RematchOutcome::Waiting
        ));
        assert_eq!(rc.pending_count(), 1);
    }

    #[test]
    fn test_requests_against_different_games_do_not_pair() {
        let mut rc = RematchCoordinator::new();
        rc.request(GameId(1), seat(10));
        assert!(matches!(
            rc.request(GameId(2), seat(20)),
            RematchOutcome::Waiting
        ));
        assert_eq!(rc.pending_count(), 2);
    }

    #[test]
    fn test_cancel_for_game_reports_waiting_player() {
        let mut rc = RematchCoordinator::new();
        rc.request(GameId(1), seat(10));
        assert_eq!(rc.cancel_for_game(GameId(1)), Some(PlayerId(10)));
        assert_eq!(rc.cancel_for_game(GameId(1)), None);
    }

    #[test]
    fn test_cancel_by_player() {
        let mut rc = RematchCoordinator::new();
        rc.request(GameId(3), seat(10));
        assert_eq!(rc.cancel_by_player(PlayerId(10)), Some(GameId(3)));
        assert_eq!(rc.cancel_by_player(PlayerId(10)), None);
        assert_eq!(rc.pending_count(), 0);
    }
}
