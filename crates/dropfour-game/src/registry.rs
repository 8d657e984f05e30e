//! Session registry: spawns sessions and tracks who plays where.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use dropfour_protocol::{GameId, PlayerId};
use tokio::sync::mpsc;

use crate::session::spawn_session;
use crate::{
    GameError, HumanSeat, MatchResult, OpponentSeat, SessionConfig,
    SessionHandle,
};

/// Counter for generating unique game IDs.
static NEXT_GAME_ID: AtomicU64 = AtomicU64::new(1);

/// Tracks all live sessions and the player-to-session index.
///
/// A finished session (Won or Drawn) stays registered so its players
/// can negotiate a rematch; it is removed when a participant returns
/// to the lobby, disconnects, or the rematch replaces it.
pub struct SessionRegistry {
    config: SessionConfig,
    results: mpsc::UnboundedSender<MatchResult>,

    /// Live sessions, keyed by game ID.
    sessions: HashMap<GameId, SessionHandle>,

    /// Maps each player to the session they're in.
    /// A player can be in at most ONE session at a time (key invariant).
    player_sessions: HashMap<PlayerId, GameId>,
}

impl SessionRegistry {
    /// Creates an empty registry. Terminal results of every session it
    /// spawns are reported on `results`.
    pub fn new(
        config: SessionConfig,
        results: mpsc::UnboundedSender<MatchResult>,
    ) -> Self {
        Self {
            config,
            results,
            sessions: HashMap::new(),
            player_sessions: HashMap::new(),
        }
    }

    /// Spawns a session for the given seats and returns its ID.
    ///
    /// Enforces the "one session at a time" invariant for every human
    /// involved.
    pub fn start_game(
        &mut self,
        player_one: HumanSeat,
        player_two: OpponentSeat,
        turn_seconds: u32,
    ) -> Result<GameId, GameError> {
        self.ensure_free(player_one.player)?;
        if let OpponentSeat::Human(seat) = &player_two {
            self.ensure_free(seat.player)?;
        }

        let game_id = GameId(NEXT_GAME_ID.fetch_add(1, Ordering::Relaxed));
        self.player_sessions.insert(player_one.player, game_id);
        if let OpponentSeat::Human(seat) = &player_two {
            self.player_sessions.insert(seat.player, game_id);
        }

        let handle = spawn_session(
            game_id,
            player_one,
            player_two,
            turn_seconds,
            self.config.clone(),
            self.results.clone(),
        );
        self.sessions.insert(game_id, handle);
        tracing::info!(%game_id, "game registered");
        Ok(game_id)
    }

    fn ensure_free(&self, player: PlayerId) -> Result<(), GameError> {
        match self.player_sessions.get(&player) {
            Some(game_id) => Err(GameError::AlreadyInGame(player, *game_id)),
            None => Ok(()),
        }
    }

    /// The session a player is currently in, if any.
    pub fn player_game(&self, player: PlayerId) -> Option<GameId> {
        self.player_sessions.get(&player).copied()
    }

    /// Handle for a specific session.
    pub fn handle(&self, game_id: GameId) -> Result<&SessionHandle, GameError> {
        self.sessions.get(&game_id).ok_or(GameError::NotFound(game_id))
    }

    /// Handle for the session a player is in.
    pub fn handle_for(
        &self,
        player: PlayerId,
    ) -> Result<&SessionHandle, GameError> {
        let game_id =
            self.player_game(player).ok_or_else(|| {
                GameError::InvalidState(format!(
                    "player {player} is not in any game"
                ))
            })?;
        self.handle(game_id)
    }

    /// Removes a player from their session. The actor notifies the
    /// other side; the whole session is then torn down, since a
    /// one-sided session can neither continue nor be rematched.
    ///
    /// Returns the ID of the session that was left.
    pub async fn leave(
        &mut self,
        player: PlayerId,
    ) -> Result<GameId, GameError> {
        let game_id =
            self.player_game(player).ok_or_else(|| {
                GameError::InvalidState(format!(
                    "player {player} is not in any game"
                ))
            })?;

        if let Some(handle) = self.sessions.get(&game_id) {
            let _ = handle.leave(player).await;
        }
        self.destroy(game_id).await;
        Ok(game_id)
    }

    /// Stops a session and drops every index entry pointing at it.
    pub async fn destroy(&mut self, game_id: GameId) {
        if let Some(handle) = self.sessions.remove(&game_id) {
            let _ = handle.shutdown().await;
        }
        self.player_sessions.retain(|_, gid| *gid != game_id);
        tracing::info!(%game_id, "game unregistered");
    }

    /// Number of live sessions.
    pub fn game_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dropfour_engine::Difficulty;

    fn seat(id: u64) -> HumanSeat {
        let (tx, _rx) = mpsc::unbounded_channel();
        HumanSeat { player: PlayerId(id), sender: tx }
    }

    fn registry() -> SessionRegistry {
        let (results_tx, _results_rx) = mpsc::unbounded_channel();
        SessionRegistry::new(SessionConfig::default(), results_tx)
    }

    #[tokio::test]
    async fn test_start_game_indexes_both_humans() {
        let mut reg = registry();
        let game_id = reg
            .start_game(seat(1), OpponentSeat::Human(seat(2)), 30)
            .unwrap();
        assert_eq!(reg.player_game(PlayerId(1)), Some(game_id));
        assert_eq!(reg.player_game(PlayerId(2)), Some(game_id));
        assert_eq!(reg.game_count(), 1);
    }

    #[tokio::test]
    async fn test_one_session_per_player() {
        let mut reg = registry();
        reg.start_game(seat(1), OpponentSeat::Human(seat(2)), 30)
            .unwrap();

        let err = reg
            .start_game(seat(1), OpponentSeat::Bot(Difficulty::Easy), 30)
            .unwrap_err();
        assert!(matches!(err, GameError::AlreadyInGame(p, _) if p == PlayerId(1)));

        let err = reg
            .start_game(seat(3), OpponentSeat::Human(seat(2)), 30)
            .unwrap_err();
        assert!(matches!(err, GameError::AlreadyInGame(p, _) if p == PlayerId(2)));
    }

    #[tokio::test]
    async fn test_leave_tears_down_the_session() {
        let mut reg = registry();
        let game_id = reg
            .start_game(seat(1), OpponentSeat::Human(seat(2)), 30)
            .unwrap();

        assert_eq!(reg.leave(PlayerId(1)).await.unwrap(), game_id);
        assert_eq!(reg.player_game(PlayerId(1)), None);
        assert_eq!(reg.player_game(PlayerId(2)), None);
        assert_eq!(reg.game_count(), 0);
    }

    #[tokio::test]
    async fn test_leave_without_a_session_fails() {
        let mut reg = registry();
        assert!(reg.leave(PlayerId(7)).await.is_err());
    }

    #[tokio::test]
    async fn test_destroy_frees_players_for_a_new_game() {
        let mut reg = registry();
        let game_id = reg
            .start_game(seat(1), OpponentSeat::Bot(Difficulty::Hard), 30)
            .unwrap();

        reg.destroy(game_id).await;
        assert!(reg
            .start_game(seat(1), OpponentSeat::Bot(Difficulty::Hard), 30)
            .is_ok());
    }
}
