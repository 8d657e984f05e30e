//! Session actor: an isolated Tokio task that owns one game.
//!
//! Each session runs in its own task, communicating with the outside
//! world through an mpsc channel. Moves, leaves, turn expiries, and
//! bot pacing are all branches of one `select!` loop, so a move can
//! never interleave with a timeout on the same board.

use std::time::Duration;

use dropfour_engine::{bot, Board, Difficulty, Mark};
use dropfour_protocol::{
    GameId, Opponent, Outcome, PlayerId, Recipient, ServerMessage,
};
use dropfour_timer::TurnTimer;
use tokio::sync::{mpsc, oneshot};

use crate::{GameError, SessionConfig, SessionPhase};

/// Channel sender for delivering outbound messages to a player's
/// connection handler.
pub type OutboundSender = mpsc::UnboundedSender<ServerMessage>;

/// Command channel size for session actors.
const CHANNEL_SIZE: usize = 64;

/// A connected human participant: their id plus the channel their
/// connection handler drains.
#[derive(Debug, Clone)]
pub struct HumanSeat {
    pub player: PlayerId,
    pub sender: OutboundSender,
}

/// Who occupies the second seat of a session.
#[derive(Debug, Clone)]
pub enum OpponentSeat {
    Human(HumanSeat),
    Bot(Difficulty),
}

impl OpponentSeat {
    /// The wire-level description of this seat.
    pub fn describe(&self) -> Opponent {
        match self {
            Self::Human(seat) => Opponent::Human { player: seat.player },
            Self::Bot(difficulty) => {
                Opponent::Bot { difficulty: *difficulty }
            }
        }
    }
}

/// The final result of a session, reported once when it reaches Won or
/// Drawn. Bots never appear; `outcomes` holds one entry per human.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub game_id: GameId,
    pub outcomes: Vec<(PlayerId, Outcome)>,
}

/// Commands sent to a session actor through its channel.
pub(crate) enum SessionCommand {
    /// A participant drops a disc.
    Move { player: PlayerId, column: usize },

    /// A participant leaves (lobby return or disconnect).
    Leave {
        player: PlayerId,
        reply: oneshot::Sender<Result<(), GameError>>,
    },

    /// Request a metadata snapshot.
    Info { reply: oneshot::Sender<SessionInfo> },

    /// Stop the actor.
    Shutdown,
}

/// A snapshot of session metadata (not the board itself).
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub game_id: GameId,
    pub phase: SessionPhase,
    pub player_one: PlayerId,
    pub opponent: Opponent,
    pub turn_seconds: u32,
}

/// Handle to a running session actor. Cheap to clone — it's just an
/// `mpsc::Sender` wrapper. The `SessionRegistry` holds one per game.
#[derive(Clone)]
pub struct SessionHandle {
    game_id: GameId,
    sender: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// Returns the session's unique ID.
    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    /// Delivers a move (fire-and-forget; rejections go back to the
    /// mover over their outbound channel, not this call).
    pub async fn play(
        &self,
        player: PlayerId,
        column: usize,
    ) -> Result<(), GameError> {
        self.sender
            .send(SessionCommand::Move { player, column })
            .await
            .map_err(|_| GameError::Unavailable(self.game_id))
    }

    /// Removes a participant, notifying the other side.
    pub async fn leave(&self, player: PlayerId) -> Result<(), GameError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::Leave { player, reply: reply_tx })
            .await
            .map_err(|_| GameError::Unavailable(self.game_id))?;
        reply_rx
            .await
            .map_err(|_| GameError::Unavailable(self.game_id))?
    }

    /// Requests the current session info.
    pub async fn info(&self) -> Result<SessionInfo, GameError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::Info { reply: reply_tx })
            .await
            .map_err(|_| GameError::Unavailable(self.game_id))?;
        reply_rx
            .await
            .map_err(|_| GameError::Unavailable(self.game_id))
    }

    /// Tells the session to shut down.
    pub async fn shutdown(&self) -> Result<(), GameError> {
        self.sender
            .send(SessionCommand::Shutdown)
            .await
            .map_err(|_| GameError::Unavailable(self.game_id))
    }
}

/// Spawns a session actor and returns its handle.
///
/// Seat one moves first and always belongs to a human; a bot can only
/// occupy seat two. The opening notifications (GameStarted, the empty
/// board, the first turn notice) are sent from inside the actor task.
pub fn spawn_session(
    game_id: GameId,
    player_one: HumanSeat,
    player_two: OpponentSeat,
    turn_seconds: u32,
    config: SessionConfig,
    results: mpsc::UnboundedSender<MatchResult>,
) -> SessionHandle {
    let (tx, rx) = mpsc::channel(CHANNEL_SIZE);

    let actor = SessionActor {
        game_id,
        config,
        turn_seconds,
        board: Board::new(),
        current: Mark::One,
        phase: SessionPhase::InProgress,
        consecutive_timeouts: 0,
        player_one,
        player_two,
        turn_timer: TurnTimer::new(),
        bot_timer: TurnTimer::new(),
        receiver: rx,
        results,
    };
    tokio::spawn(actor.run());

    SessionHandle { game_id, sender: tx }
}

/// The internal session actor state. Runs inside a Tokio task.
struct SessionActor {
    game_id: GameId,
    config: SessionConfig,
    turn_seconds: u32,
    board: Board,
    current: Mark,
    phase: SessionPhase,
    consecutive_timeouts: u32,
    player_one: HumanSeat,
    player_two: OpponentSeat,
    /// Armed while a human is on the clock.
    turn_timer: TurnTimer,
    /// Armed while a bot reply is pending. Bot moves bypass the turn
    /// timer entirely; this one only paces them.
    bot_timer: TurnTimer,
    receiver: mpsc::Receiver<SessionCommand>,
    results: mpsc::UnboundedSender<MatchResult>,
}

impl SessionActor {
    /// Runs the actor loop until shutdown or channel closure.
    async fn run(mut self) {
        tracing::info!(
            game_id = %self.game_id,
            player_one = %self.player_one.player,
            opponent = %self.player_two.describe(),
            turn_seconds = self.turn_seconds,
            "session started"
        );

        self.announce_start();
        self.begin_turn();

        loop {
            tokio::select! {
                biased;
                cmd = self.receiver.recv() => match cmd {
                    Some(cmd) => {
                        if self.handle_command(cmd) {
                            break;
                        }
                    }
                    None => break,
                },
                generation = self.turn_timer.wait() => {
                    self.handle_turn_timeout(generation);
                }
                _ = self.bot_timer.wait() => {
                    self.handle_bot_move();
                }
            }
        }

        self.turn_timer.disarm();
        self.bot_timer.disarm();
        tracing::info!(game_id = %self.game_id, "session stopped");
    }

    /// Returns `true` when the actor should stop.
    fn handle_command(&mut self, cmd: SessionCommand) -> bool {
        match cmd {
            SessionCommand::Move { player, column } => {
                self.handle_move(player, column);
                false
            }
            SessionCommand::Leave { player, reply } => {
                let result = self.handle_leave(player);
                let _ = reply.send(result);
                false
            }
            SessionCommand::Info { reply } => {
                let _ = reply.send(self.info());
                false
            }
            SessionCommand::Shutdown => {
                tracing::debug!(game_id = %self.game_id, "session shutting down");
                true
            }
        }
    }

    // -- opening ----------------------------------------------------------

    fn announce_start(&self) {
        self.send_to_seat(
            Mark::One,
            ServerMessage::GameStarted {
                opponent: self.player_two.describe(),
                turn_seconds: self.turn_seconds,
            },
        );
        self.send_to_seat(
            Mark::Two,
            ServerMessage::GameStarted {
                opponent: Opponent::Human { player: self.player_one.player },
                turn_seconds: self.turn_seconds,
            },
        );
        self.broadcast_board();
    }

    // -- moves ------------------------------------------------------------

    fn handle_move(&mut self, player: PlayerId, column: usize) {
        let Some(mark) = self.mark_of(player) else {
            tracing::warn!(
                game_id = %self.game_id,
                %player,
                "move from non-participant, ignoring"
            );
            return;
        };

        // Rejections are reported to the mover only; the opponent and
        // the board stay untouched.
        if self.phase.is_finished() {
            self.reject(player, "game is already over");
            return;
        }
        if mark != self.current {
            self.reject(player, "not your turn");
            return;
        }
        if !self.board.is_legal_move(column) {
            self.reject(player, "illegal move");
            return;
        }

        tracing::debug!(game_id = %self.game_id, %player, column, "move accepted");
        self.apply_accepted_move(mark, column);
    }

    fn reject(&self, player: PlayerId, reason: &str) {
        tracing::debug!(game_id = %self.game_id, %player, reason, "move rejected");
        self.send(
            Recipient::Player(player),
            ServerMessage::Error { message: reason.to_string() },
        );
    }

    /// Commits a legal move (human or bot) and advances the machine.
    fn apply_accepted_move(&mut self, mark: Mark, column: usize) {
        if !self.board.apply_move(column, mark) {
            return;
        }
        // Any accepted move breaks the timeout streak.
        self.consecutive_timeouts = 0;
        self.turn_timer.disarm();
        self.broadcast_board();

        if self.board.winner() == Some(mark) {
            self.finish_won(mark);
        } else if self.board.is_draw() {
            self.finish_drawn(Outcome::Draw);
        } else {
            self.current = self.current.other();
            self.begin_turn();
        }
    }

    // -- turn control -----------------------------------------------------

    /// Starts the clock for `self.current`: the pacing delay when a
    /// bot is up, otherwise the turn notice plus the full turn timer.
    fn begin_turn(&mut self) {
        let Some(player) =
            self.human_at(self.current).map(|seat| seat.player)
        else {
            self.bot_timer.arm(self.config.bot_move_delay);
            return;
        };

        self.send(Recipient::Both, ServerMessage::Turn { player });
        self.send(
            Recipient::Both,
            ServerMessage::TimerUpdate {
                seconds_remaining: self.turn_seconds,
            },
        );
        self.turn_timer
            .arm(Duration::from_secs(u64::from(self.turn_seconds)));
    }

    fn handle_turn_timeout(&mut self, generation: u64) {
        if self.phase.is_finished()
            || generation != self.turn_timer.generation()
        {
            return;
        }

        self.consecutive_timeouts += 1;
        tracing::info!(
            game_id = %self.game_id,
            streak = self.consecutive_timeouts,
            "turn timed out"
        );

        if self.consecutive_timeouts >= self.config.max_consecutive_timeouts {
            self.finish_drawn(Outcome::InactivityDraw);
            return;
        }

        // Forfeit the turn: no board mutation, just a handover.
        if let Some(seat) = self.human_at(self.current) {
            self.send(
                Recipient::Player(seat.player),
                ServerMessage::TurnSkipped,
            );
        }
        self.broadcast_board();
        self.current = self.current.other();
        self.begin_turn();
    }

    fn handle_bot_move(&mut self) {
        if self.phase.is_finished() {
            return;
        }
        let OpponentSeat::Bot(difficulty) = &self.player_two else {
            return;
        };
        let difficulty = *difficulty;

        if let Some(column) =
            bot::choose_move(&self.board, difficulty, Mark::Two)
        {
            tracing::debug!(game_id = %self.game_id, column, "bot move");
            self.apply_accepted_move(Mark::Two, column);
        }
    }

    // -- endings ----------------------------------------------------------

    fn finish_won(&mut self, winner: Mark) {
        self.phase = SessionPhase::Won;
        self.stop_clocks();
        self.send_to_seat(
            winner,
            ServerMessage::GameOver { outcome: Outcome::Win },
        );
        self.send_to_seat(
            winner.other(),
            ServerMessage::GameOver { outcome: Outcome::Loss },
        );
        tracing::info!(game_id = %self.game_id, winner = %winner, "game won");
        self.report_result(|mark| {
            if mark == winner { Outcome::Win } else { Outcome::Loss }
        });
    }

    fn finish_drawn(&mut self, outcome: Outcome) {
        self.phase = SessionPhase::Drawn;
        self.stop_clocks();
        self.send(Recipient::Both, ServerMessage::GameOver { outcome });
        tracing::info!(game_id = %self.game_id, %outcome, "game drawn");
        self.report_result(|_| outcome);
    }

    fn handle_leave(&mut self, player: PlayerId) -> Result<(), GameError> {
        let Some(mark) = self.mark_of(player) else {
            return Err(GameError::NotInGame(player, self.game_id));
        };

        if !self.phase.is_finished() {
            self.phase = SessionPhase::Abandoned;
            self.stop_clocks();
        }

        // Best effort: the other side may already be gone.
        if let Some(seat) = self.human_at(mark.other()) {
            let _ = seat.sender.send(ServerMessage::OpponentLeft);
        }
        tracing::info!(game_id = %self.game_id, %player, "participant left");
        Ok(())
    }

    fn stop_clocks(&mut self) {
        self.turn_timer.disarm();
        self.bot_timer.disarm();
    }

    fn report_result(&self, outcome_of: impl Fn(Mark) -> Outcome) {
        let mut outcomes = Vec::with_capacity(2);
        outcomes.push((self.player_one.player, outcome_of(Mark::One)));
        if let OpponentSeat::Human(seat) = &self.player_two {
            outcomes.push((seat.player, outcome_of(Mark::Two)));
        }
        let _ = self
            .results
            .send(MatchResult { game_id: self.game_id, outcomes });
    }

    // -- seats and delivery -----------------------------------------------

    fn info(&self) -> SessionInfo {
        SessionInfo {
            game_id: self.game_id,
            phase: self.phase,
            player_one: self.player_one.player,
            opponent: self.player_two.describe(),
            turn_seconds: self.turn_seconds,
        }
    }

    fn mark_of(&self, player: PlayerId) -> Option<Mark> {
        if self.player_one.player == player {
            return Some(Mark::One);
        }
        match &self.player_two {
            OpponentSeat::Human(seat) if seat.player == player => {
                Some(Mark::Two)
            }
            _ => None,
        }
    }

    fn human_at(&self, mark: Mark) -> Option<&HumanSeat> {
        match mark {
            Mark::One => Some(&self.player_one),
            Mark::Two => match &self.player_two {
                OpponentSeat::Human(seat) => Some(seat),
                OpponentSeat::Bot(_) => None,
            },
        }
    }

    fn send_to_seat(&self, mark: Mark, msg: ServerMessage) {
        if let Some(seat) = self.human_at(mark) {
            let _ = seat.sender.send(msg);
        }
    }

    fn broadcast_board(&self) {
        self.send(
            Recipient::Both,
            ServerMessage::BoardUpdate { board: self.board.serialize() },
        );
    }

    /// Delivers a message. A closed receiver means that connection is
    /// gone; delivery failures here are handled by the leave path, not
    /// by the sender.
    fn send(&self, recipient: Recipient, msg: ServerMessage) {
        match recipient {
            Recipient::Both => {
                self.send_to_seat(Mark::One, msg.clone());
                self.send_to_seat(Mark::Two, msg);
            }
            Recipient::Player(player) => {
                if let Some(mark) = self.mark_of(player) {
                    self.send_to_seat(mark, msg);
                }
            }
        }
    }
}
