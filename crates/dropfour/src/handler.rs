//! Per-connection handler: identity, outbound pump, and dispatch.
//!
//! Each accepted connection gets its own Tokio task running this
//! handler. The flow is:
//!   1. Assign a fresh `PlayerId` and send `Welcome`
//!   2. Spawn the outbound pump (channel → encode → socket)
//!   3. Loop: receive client messages → dispatch to lobby tables or
//!      the player's session actor
//!
//! Session actors push into the same outbound channel the dispatch
//! replies use, so everything a client sees left the server in one
//! ordered stream.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dropfour_game::{HumanSeat, OpponentSeat, RematchOutcome};
use dropfour_protocol::{
    ClientMessage, Codec, Opponent, PlayerId, ServerMessage,
};
use dropfour_transport::WsConnection;
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::stats::StatsSink;
use crate::DropfourError;

/// Counter for assigning player identities. One connection is one
/// player for its whole lifetime; there is no authentication.
static NEXT_PLAYER_ID: AtomicU64 = AtomicU64::new(1);

type Outbound = mpsc::UnboundedSender<ServerMessage>;

/// Drop guard that scrubs a player out of every shared table when the
/// handler exits.
///
/// This ensures cleanup happens even if the handler panics. Since
/// `Drop` is synchronous, we spawn a fire-and-forget task for the
/// async locks.
struct LobbyGuard<S: StatsSink> {
    player: PlayerId,
    state: Arc<ServerState<S>>,
}

impl<S: StatsSink> Drop for LobbyGuard<S> {
    fn drop(&mut self) {
        let player = self.player;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            {
                // A host may hold several open entries; drop them all.
                let mut matchmaker = state.matchmaker.lock().await;
                while matchmaker.cancel(player).is_ok() {}
            }

            let left_game = {
                let mut registry = state.registry.lock().await;
                if registry.player_game(player).is_some() {
                    registry.leave(player).await.ok()
                } else {
                    None
                }
            };

            let mut rematch = state.rematch.lock().await;
            rematch.cancel_by_player(player);
            if let Some(game_id) = left_game {
                rematch.cancel_for_game(game_id);
            }
            tracing::debug!(%player, "lobby state cleaned up");
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<S: StatsSink>(
    conn: WsConnection,
    state: Arc<ServerState<S>>,
) -> Result<(), DropfourError> {
    let conn = Arc::new(conn);
    let player = PlayerId(NEXT_PLAYER_ID.fetch_add(1, Ordering::Relaxed));
    tracing::info!(conn_id = %conn.id(), %player, "player connected");

    // Outbound pump: everything addressed to this player funnels
    // through one channel onto the socket.
    let (tx, mut outbound_rx) = mpsc::unbounded_channel::<ServerMessage>();
    let writer_conn = Arc::clone(&conn);
    let codec = state.codec;
    let writer = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            let bytes = match codec.encode(&msg) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(error = %e, "dropping unencodable message");
                    continue;
                }
            };
            if writer_conn.send(&bytes).await.is_err() {
                break;
            }
        }
    });

    let _ = tx.send(ServerMessage::Welcome { player });
    let _guard = LobbyGuard { player, state: Arc::clone(&state) };

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%player, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%player, error = %e, "recv error");
                break;
            }
        };

        let msg: ClientMessage = match state.codec.decode(&data) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(%player, error = %e, "undecodable message");
                let _ = tx.send(ServerMessage::Error {
                    message: "invalid message".to_string(),
                });
                continue;
            }
        };

        dispatch(&state, player, &tx, msg).await;
    }

    writer.abort();
    // _guard drops here → table cleanup fires.
    Ok(())
}

/// Routes one client message.
async fn dispatch<S: StatsSink>(
    state: &Arc<ServerState<S>>,
    player: PlayerId,
    tx: &Outbound,
    msg: ClientMessage,
) {
    match msg {
        ClientMessage::CreateGame { turn_seconds } => {
            create_game(state, player, tx, turn_seconds).await;
        }

        ClientMessage::CreateBotGame { difficulty, turn_seconds } => {
            if !valid_turn_seconds(turn_seconds, tx) {
                return;
            }
            if in_game(state, player, tx).await {
                return;
            }
            // Queued open games are superseded by playing a bot now.
            {
                let mut matchmaker = state.matchmaker.lock().await;
                while matchmaker.cancel(player).is_ok() {}
            }

            let seat = HumanSeat { player, sender: tx.clone() };
            let result = state.registry.lock().await.start_game(
                seat,
                OpponentSeat::Bot(difficulty),
                turn_seconds,
            );
            if let Err(e) = result {
                reply_error(tx, &e);
            }
        }

        ClientMessage::RequestGames => {
            let games = state.matchmaker.lock().await.open_games();
            let _ = tx.send(ServerMessage::GameList { games });
        }

        ClientMessage::JoinGame => {
            join_game(state, player, tx).await;
        }

        ClientMessage::Move { column } => {
            let handle = state
                .registry
                .lock()
                .await
                .handle_for(player)
                .cloned();
            match handle {
                Ok(handle) => {
                    let _ = handle.play(player, column).await;
                }
                Err(e) => reply_error(tx, &e),
            }
        }

        ClientMessage::Rematch => {
            rematch(state, player, tx).await;
        }

        ClientMessage::ReturnToLobby => {
            return_to_lobby(state, player, tx).await;
        }

        ClientMessage::CancelGameCreation => {
            let result = state.matchmaker.lock().await.cancel(player);
            let reply = match result {
                Ok(()) => ServerMessage::CreationCancelled,
                Err(_) => ServerMessage::NotInQueue,
            };
            let _ = tx.send(reply);
        }
    }
}

async fn create_game<S: StatsSink>(
    state: &Arc<ServerState<S>>,
    player: PlayerId,
    tx: &Outbound,
    turn_seconds: u32,
) {
    if !valid_turn_seconds(turn_seconds, tx) {
        return;
    }
    if in_game(state, player, tx).await {
        return;
    }

    let seat = HumanSeat { player, sender: tx.clone() };
    state.matchmaker.lock().await.enqueue(seat, turn_seconds);
    let _ = tx.send(ServerMessage::GameCreated);
}

async fn join_game<S: StatsSink>(
    state: &Arc<ServerState<S>>,
    player: PlayerId,
    tx: &Outbound,
) {
    if in_game(state, player, tx).await {
        return;
    }

    let Some(entry) = state.matchmaker.lock().await.take_oldest(player)
    else {
        let _ = tx.send(ServerMessage::NoGamesAvailable);
        return;
    };

    // The host took seat one: they move first and their requested turn
    // duration applies.
    let joiner = HumanSeat { player, sender: tx.clone() };
    let result = state.registry.lock().await.start_game(
        entry.host.clone(),
        OpponentSeat::Human(joiner),
        entry.turn_seconds,
    );
    if let Err(e) = result {
        // Give the host their spot back; only the joiner is told.
        state
            .matchmaker
            .lock()
            .await
            .enqueue(entry.host, entry.turn_seconds);
        reply_error(tx, &e);
    }
}

async fn rematch<S: StatsSink>(
    state: &Arc<ServerState<S>>,
    player: PlayerId,
    tx: &Outbound,
) {
    let info = {
        let registry = state.registry.lock().await;
        match registry.handle_for(player) {
            Ok(handle) => handle.info().await,
            Err(e) => Err(e),
        }
    };
    let info = match info {
        Ok(info) => info,
        Err(e) => {
            reply_error(tx, &e);
            return;
        }
    };
    if !info.phase.is_rematchable() {
        let _ = tx.send(ServerMessage::Error {
            message: "no finished game to rematch".to_string(),
        });
        return;
    }

    let seat = HumanSeat { player, sender: tx.clone() };
    match info.opponent {
        // Nobody to wait for: replace the finished session right away.
        Opponent::Bot { difficulty } => {
            let mut registry = state.registry.lock().await;
            registry.destroy(info.game_id).await;
            let result = registry.start_game(
                seat,
                OpponentSeat::Bot(difficulty),
                info.turn_seconds,
            );
            if let Err(e) = result {
                reply_error(tx, &e);
            }
        }

        Opponent::Human { .. } => {
            let outcome =
                state.rematch.lock().await.request(info.game_id, seat);
            match outcome {
                RematchOutcome::Waiting => {
                    let _ = tx.send(ServerMessage::RematchWaiting);
                }
                RematchOutcome::Paired { player_one, player_two } => {
                    let mut registry = state.registry.lock().await;
                    registry.destroy(info.game_id).await;
                    let result = registry.start_game(
                        player_one,
                        OpponentSeat::Human(player_two),
                        info.turn_seconds,
                    );
                    if let Err(e) = result {
                        reply_error(tx, &e);
                    }
                }
            }
        }
    }
}

async fn return_to_lobby<S: StatsSink>(
    state: &Arc<ServerState<S>>,
    player: PlayerId,
    tx: &Outbound,
) {
    let left = state.registry.lock().await.leave(player).await;
    match left {
        Ok(game_id) => {
            let mut rematch = state.rematch.lock().await;
            rematch.cancel_by_player(player);
            rematch.cancel_for_game(game_id);
        }
        Err(e) => reply_error(tx, &e),
    }
}

/// Rejects a zero turn duration before it reaches a session.
fn valid_turn_seconds(turn_seconds: u32, tx: &Outbound) -> bool {
    if turn_seconds == 0 {
        let _ = tx.send(ServerMessage::Error {
            message: "turn duration must be positive".to_string(),
        });
        return false;
    }
    true
}

/// Checks whether the player is already in a session and tells them so.
async fn in_game<S: StatsSink>(
    state: &Arc<ServerState<S>>,
    player: PlayerId,
    tx: &Outbound,
) -> bool {
    if let Some(game_id) = state.registry.lock().await.player_game(player) {
        let _ = tx.send(ServerMessage::Error {
            message: format!("already in game {game_id}"),
        });
        return true;
    }
    false
}

fn reply_error(tx: &Outbound, err: &impl std::fmt::Display) {
    let _ = tx.send(ServerMessage::Error { message: err.to_string() });
}
