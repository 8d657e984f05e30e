//! Integration tests for the server: real WebSocket clients driving
//! the full lobby → session → rematch flow.

use std::time::Duration;

use dropfour::{DropfourServerBuilder, MemoryStats};
use dropfour_engine::Difficulty;
use dropfour_game::SessionConfig;
use dropfour_protocol::{
    ClientMessage, Opponent, Outcome, PlayerId, ServerMessage,
};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port. Bot pacing is shortened so bot
/// tests don't sleep through the default one-second delay.
async fn start_server() -> (String, MemoryStats) {
    let stats = MemoryStats::new();
    let server = DropfourServerBuilder::new()
        .bind("127.0.0.1:0")
        .session_config(SessionConfig {
            bot_move_delay: Duration::from_millis(20),
            ..SessionConfig::default()
        })
        .build(stats.clone())
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    (addr, stats)
}

/// Connects and consumes the Welcome message.
async fn connect(addr: &str) -> (ClientWs, PlayerId) {
    let (mut ws, _) =
        tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("should connect");
    let player = match recv(&mut ws).await {
        ServerMessage::Welcome { player } => player,
        other => panic!("expected Welcome, got {other:?}"),
    };
    (ws, player)
}

async fn send(ws: &mut ClientWs, msg: &ClientMessage) {
    let bytes = serde_json::to_vec(msg).expect("encode");
    ws.send(Message::Binary(bytes.into())).await.expect("send");
}

async fn recv(ws: &mut ClientWs) -> ServerMessage {
    let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("timed out waiting for a message")
        .expect("stream ended")
        .expect("recv failed");
    serde_json::from_slice(&msg.into_data()).expect("decode")
}

/// Consumes BoardUpdate → Turn → TimerUpdate and returns the board and
/// whose turn it is.
async fn recv_handover(ws: &mut ClientWs) -> (String, PlayerId) {
    let board = match recv(ws).await {
        ServerMessage::BoardUpdate { board } => board,
        other => panic!("expected BoardUpdate, got {other:?}"),
    };
    let player = match recv(ws).await {
        ServerMessage::Turn { player } => player,
        other => panic!("expected Turn, got {other:?}"),
    };
    match recv(ws).await {
        ServerMessage::TimerUpdate { .. } => {}
        other => panic!("expected TimerUpdate, got {other:?}"),
    }
    (board, player)
}

/// Consumes a GameStarted and returns the reported opponent and turn
/// duration.
async fn recv_game_started(ws: &mut ClientWs) -> (Opponent, u32) {
    match recv(ws).await {
        ServerMessage::GameStarted { opponent, turn_seconds } => {
            (opponent, turn_seconds)
        }
        other => panic!("expected GameStarted, got {other:?}"),
    }
}

/// Creates a game from `host`, joins from `joiner`, and drains the
/// opening messages on both sides.
async fn start_human_game(
    host: &mut ClientWs,
    host_id: PlayerId,
    joiner: &mut ClientWs,
    joiner_id: PlayerId,
    turn_seconds: u32,
) {
    send(host, &ClientMessage::CreateGame { turn_seconds }).await;
    assert!(matches!(recv(host).await, ServerMessage::GameCreated));

    send(joiner, &ClientMessage::JoinGame).await;

    let (opponent, secs) = recv_game_started(host).await;
    assert_eq!(opponent, Opponent::Human { player: joiner_id });
    assert_eq!(secs, turn_seconds);
    let (_, first) = recv_handover(host).await;
    assert_eq!(first, host_id);

    let (opponent, _) = recv_game_started(joiner).await;
    assert_eq!(opponent, Opponent::Human { player: host_id });
    let (_, first) = recv_handover(joiner).await;
    assert_eq!(first, host_id);
}

/// Plays the host to a vertical win in column 0 while the joiner
/// answers in column 1, consuming every update on both sockets, and
/// checks the closing GameOver pair.
async fn play_host_win(host: &mut ClientWs, joiner: &mut ClientWs) {
    for _ in 0..3 {
        send(host, &ClientMessage::Move { column: 0 }).await;
        recv_handover(host).await;
        recv_handover(joiner).await;

        send(joiner, &ClientMessage::Move { column: 1 }).await;
        recv_handover(host).await;
        recv_handover(joiner).await;
    }

    send(host, &ClientMessage::Move { column: 0 }).await;
    assert!(matches!(recv(host).await, ServerMessage::BoardUpdate { .. }));
    assert_eq!(
        recv(host).await,
        ServerMessage::GameOver { outcome: Outcome::Win }
    );
    assert!(matches!(recv(joiner).await, ServerMessage::BoardUpdate { .. }));
    assert_eq!(
        recv(joiner).await,
        ServerMessage::GameOver { outcome: Outcome::Loss }
    );
}

// =========================================================================
// Lobby
// =========================================================================

#[tokio::test]
async fn test_welcome_assigns_distinct_ids() {
    let (addr, _) = start_server().await;
    let (_ws1, p1) = connect(&addr).await;
    let (_ws2, p2) = connect(&addr).await;
    assert_ne!(p1, p2);
}

#[tokio::test]
async fn test_join_with_empty_queue() {
    let (addr, _) = start_server().await;
    let (mut ws, _) = connect(&addr).await;

    send(&mut ws, &ClientMessage::JoinGame).await;
    assert!(matches!(recv(&mut ws).await, ServerMessage::NoGamesAvailable));
}

#[tokio::test]
async fn test_game_list_shows_waiting_hosts() {
    let (addr, _) = start_server().await;
    let (mut host, host_id) = connect(&addr).await;
    let (mut other, _) = connect(&addr).await;

    send(&mut other, &ClientMessage::RequestGames).await;
    match recv(&mut other).await {
        ServerMessage::GameList { games } => assert!(games.is_empty()),
        other => panic!("expected GameList, got {other:?}"),
    }

    send(&mut host, &ClientMessage::CreateGame { turn_seconds: 45 }).await;
    assert!(matches!(recv(&mut host).await, ServerMessage::GameCreated));

    send(&mut other, &ClientMessage::RequestGames).await;
    match recv(&mut other).await {
        ServerMessage::GameList { games } => {
            assert_eq!(games.len(), 1);
            assert_eq!(games[0].host, host_id);
            assert_eq!(games[0].turn_seconds, 45);
        }
        other => panic!("expected GameList, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fifo_pairing_uses_oldest_host() {
    let (addr, _) = start_server().await;
    let (mut h1, p1) = connect(&addr).await;
    let (mut h2, _) = connect(&addr).await;
    let (mut joiner, joiner_id) = connect(&addr).await;

    send(&mut h1, &ClientMessage::CreateGame { turn_seconds: 30 }).await;
    assert!(matches!(recv(&mut h1).await, ServerMessage::GameCreated));
    send(&mut h2, &ClientMessage::CreateGame { turn_seconds: 15 }).await;
    assert!(matches!(recv(&mut h2).await, ServerMessage::GameCreated));

    send(&mut joiner, &ClientMessage::JoinGame).await;
    let (opponent, secs) = recv_game_started(&mut joiner).await;
    assert_eq!(opponent, Opponent::Human { player: p1 });
    assert_eq!(secs, 30);

    // The second host is still waiting.
    send(&mut joiner, &ClientMessage::RequestGames).await;
    // Drain the joiner's own opening first.
    let _ = recv_handover(&mut joiner).await;
    match recv(&mut joiner).await {
        ServerMessage::GameList { games } => assert_eq!(games.len(), 1),
        other => panic!("expected GameList, got {other:?}"),
    }
}

#[tokio::test]
async fn test_cancel_game_creation() {
    let (addr, _) = start_server().await;
    let (mut ws, _) = connect(&addr).await;

    send(&mut ws, &ClientMessage::CreateGame { turn_seconds: 30 }).await;
    assert!(matches!(recv(&mut ws).await, ServerMessage::GameCreated));

    send(&mut ws, &ClientMessage::CancelGameCreation).await;
    assert!(matches!(recv(&mut ws).await, ServerMessage::CreationCancelled));

    // Nothing left to cancel.
    send(&mut ws, &ClientMessage::CancelGameCreation).await;
    assert!(matches!(recv(&mut ws).await, ServerMessage::NotInQueue));
}

#[tokio::test]
async fn test_double_create_enqueues_twice() {
    let (addr, _) = start_server().await;
    let (mut host, host_id) = connect(&addr).await;
    let (mut other, _) = connect(&addr).await;

    // Creating twice is not deduplicated; both entries are listed.
    send(&mut host, &ClientMessage::CreateGame { turn_seconds: 30 }).await;
    assert!(matches!(recv(&mut host).await, ServerMessage::GameCreated));
    send(&mut host, &ClientMessage::CreateGame { turn_seconds: 60 }).await;
    assert!(matches!(recv(&mut host).await, ServerMessage::GameCreated));

    send(&mut other, &ClientMessage::RequestGames).await;
    match recv(&mut other).await {
        ServerMessage::GameList { games } => {
            assert_eq!(games.len(), 2);
            assert_eq!(games[0].host, host_id);
            assert_eq!(games[0].turn_seconds, 30);
            assert_eq!(games[1].host, host_id);
            assert_eq!(games[1].turn_seconds, 60);
        }
        other => panic!("expected GameList, got {other:?}"),
    }
}

#[tokio::test]
async fn test_zero_turn_duration_rejected() {
    let (addr, _) = start_server().await;
    let (mut ws, _) = connect(&addr).await;

    send(&mut ws, &ClientMessage::CreateGame { turn_seconds: 0 }).await;
    assert!(matches!(recv(&mut ws).await, ServerMessage::Error { .. }));
}

#[tokio::test]
async fn test_move_without_a_game_is_an_error() {
    let (addr, _) = start_server().await;
    let (mut ws, _) = connect(&addr).await;

    send(&mut ws, &ClientMessage::Move { column: 3 }).await;
    assert!(matches!(recv(&mut ws).await, ServerMessage::Error { .. }));
}

// =========================================================================
// Games
// =========================================================================

#[tokio::test]
async fn test_full_game_records_results() {
    let (addr, stats) = start_server().await;
    let (mut host, host_id) = connect(&addr).await;
    let (mut joiner, joiner_id) = connect(&addr).await;

    start_human_game(&mut host, host_id, &mut joiner, joiner_id, 30).await;
    play_host_win(&mut host, &mut joiner).await;

    // The results pump runs asynchronously.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(stats.stats_for(host_id).await.wins, 1);
    assert_eq!(stats.stats_for(joiner_id).await.losses, 1);
}

#[tokio::test]
async fn test_illegal_move_reported_only_to_mover() {
    let (addr, _) = start_server().await;
    let (mut host, host_id) = connect(&addr).await;
    let (mut joiner, joiner_id) = connect(&addr).await;
    start_human_game(&mut host, host_id, &mut joiner, joiner_id, 30).await;

    // Joiner moves out of turn.
    send(&mut joiner, &ClientMessage::Move { column: 3 }).await;
    assert!(matches!(recv(&mut joiner).await, ServerMessage::Error { .. }));

    // The game proceeds normally for the host.
    send(&mut host, &ClientMessage::Move { column: 3 }).await;
    let (board, next) = recv_handover(&mut host).await;
    assert_eq!(board, "0000000,0000000,0000000,0000000,0000000,0001000");
    assert_eq!(next, joiner_id);
}

#[tokio::test]
async fn test_timeouts_skip_then_draw() {
    let (addr, _) = start_server().await;
    let (mut host, host_id) = connect(&addr).await;
    let (mut joiner, joiner_id) = connect(&addr).await;
    start_human_game(&mut host, host_id, &mut joiner, joiner_id, 1).await;

    // The host lets their clock run out: their turn is forfeited.
    assert_eq!(recv(&mut host).await, ServerMessage::TurnSkipped);
    let (_, next) = recv_handover(&mut host).await;
    assert_eq!(next, joiner_id);
    recv_handover(&mut joiner).await;

    // The joiner does the same; back-to-back expiries end the game.
    assert_eq!(
        recv(&mut host).await,
        ServerMessage::GameOver { outcome: Outcome::InactivityDraw }
    );
    assert_eq!(
        recv(&mut joiner).await,
        ServerMessage::GameOver { outcome: Outcome::InactivityDraw }
    );
}

#[tokio::test]
async fn test_bot_game_plays_back() {
    let (addr, _) = start_server().await;
    let (mut ws, player) = connect(&addr).await;

    send(
        &mut ws,
        &ClientMessage::CreateBotGame {
            difficulty: Difficulty::Hard,
            turn_seconds: 30,
        },
    )
    .await;

    let (opponent, _) = recv_game_started(&mut ws).await;
    assert_eq!(opponent, Opponent::Bot { difficulty: Difficulty::Hard });
    let (board, first) = recv_handover(&mut ws).await;
    assert_eq!(board, "0000000,0000000,0000000,0000000,0000000,0000000");
    assert_eq!(first, player);

    send(&mut ws, &ClientMessage::Move { column: 3 }).await;
    match recv(&mut ws).await {
        ServerMessage::BoardUpdate { board } => {
            assert_eq!(board, "0000000,0000000,0000000,0000000,0000000,0001000");
        }
        other => panic!("expected BoardUpdate, got {other:?}"),
    }

    // After the pacing delay the hard bot answers in the center.
    let (board, next) = recv_handover(&mut ws).await;
    assert_eq!(board, "0000000,0000000,0000000,0000000,0002000,0001000");
    assert_eq!(next, player);
}

// =========================================================================
// Rematch and leaving
// =========================================================================

#[tokio::test]
async fn test_rematch_swaps_first_mover() {
    let (addr, _) = start_server().await;
    let (mut host, host_id) = connect(&addr).await;
    let (mut joiner, joiner_id) = connect(&addr).await;
    start_human_game(&mut host, host_id, &mut joiner, joiner_id, 30).await;
    play_host_win(&mut host, &mut joiner).await;

    send(&mut host, &ClientMessage::Rematch).await;
    assert!(matches!(recv(&mut host).await, ServerMessage::RematchWaiting));

    // The second requester takes seat one and moves first.
    send(&mut joiner, &ClientMessage::Rematch).await;
    let (opponent, secs) = recv_game_started(&mut joiner).await;
    assert_eq!(opponent, Opponent::Human { player: host_id });
    assert_eq!(secs, 30);
    let (board, first) = recv_handover(&mut joiner).await;
    assert_eq!(board, "0000000,0000000,0000000,0000000,0000000,0000000");
    assert_eq!(first, joiner_id);

    recv_game_started(&mut host).await;
    let (_, first) = recv_handover(&mut host).await;
    assert_eq!(first, joiner_id);
}

#[tokio::test]
async fn test_bot_rematch_restarts_immediately() {
    let (addr, _) = start_server().await;
    let (mut ws, player) = connect(&addr).await;

    send(
        &mut ws,
        &ClientMessage::CreateBotGame {
            difficulty: Difficulty::Hard,
            turn_seconds: 25,
        },
    )
    .await;
    let (opponent, secs) = recv_game_started(&mut ws).await;
    assert_eq!(opponent, Opponent::Bot { difficulty: Difficulty::Hard });
    assert_eq!(secs, 25);
    recv_handover(&mut ws).await;

    // Bottom-row fork: after 3, 2, 4 the player threatens to finish at
    // both 1 and 5, the bot can only block one side, and 5 wins.
    for column in [3, 2, 4] {
        send(&mut ws, &ClientMessage::Move { column }).await;
        assert!(matches!(
            recv(&mut ws).await,
            ServerMessage::BoardUpdate { .. }
        ));
        recv_handover(&mut ws).await;
    }
    send(&mut ws, &ClientMessage::Move { column: 5 }).await;
    assert!(matches!(recv(&mut ws).await, ServerMessage::BoardUpdate { .. }));
    assert_eq!(
        recv(&mut ws).await,
        ServerMessage::GameOver { outcome: Outcome::Win }
    );

    // Nobody to pair with: the rematch starts at once against the same
    // bot, keeping the turn duration, with no RematchWaiting.
    send(&mut ws, &ClientMessage::Rematch).await;
    let (opponent, secs) = recv_game_started(&mut ws).await;
    assert_eq!(opponent, Opponent::Bot { difficulty: Difficulty::Hard });
    assert_eq!(secs, 25);
    let (board, first) = recv_handover(&mut ws).await;
    assert_eq!(board, "0000000,0000000,0000000,0000000,0000000,0000000");
    assert_eq!(first, player);
}

#[tokio::test]
async fn test_rematch_before_game_over_is_an_error() {
    let (addr, _) = start_server().await;
    let (mut host, host_id) = connect(&addr).await;
    let (mut joiner, joiner_id) = connect(&addr).await;
    start_human_game(&mut host, host_id, &mut joiner, joiner_id, 30).await;

    send(&mut host, &ClientMessage::Rematch).await;
    assert!(matches!(recv(&mut host).await, ServerMessage::Error { .. }));
}

#[tokio::test]
async fn test_return_to_lobby_notifies_opponent() {
    let (addr, _) = start_server().await;
    let (mut host, host_id) = connect(&addr).await;
    let (mut joiner, joiner_id) = connect(&addr).await;
    start_human_game(&mut host, host_id, &mut joiner, joiner_id, 30).await;

    send(&mut host, &ClientMessage::ReturnToLobby).await;
    assert_eq!(recv(&mut joiner).await, ServerMessage::OpponentLeft);

    // Both are free to queue again.
    send(&mut host, &ClientMessage::CreateGame { turn_seconds: 30 }).await;
    assert!(matches!(recv(&mut host).await, ServerMessage::GameCreated));
    send(&mut joiner, &ClientMessage::JoinGame).await;
    recv_game_started(&mut joiner).await;
}

#[tokio::test]
async fn test_disconnect_notifies_opponent() {
    let (addr, _) = start_server().await;
    let (mut host, host_id) = connect(&addr).await;
    let (mut joiner, joiner_id) = connect(&addr).await;
    start_human_game(&mut host, host_id, &mut joiner, joiner_id, 30).await;

    drop(host);
    assert_eq!(recv(&mut joiner).await, ServerMessage::OpponentLeft);
}

#[tokio::test]
async fn test_rematch_cancelled_when_opponent_leaves() {
    let (addr, _) = start_server().await;
    let (mut host, host_id) = connect(&addr).await;
    let (mut joiner, joiner_id) = connect(&addr).await;
    start_human_game(&mut host, host_id, &mut joiner, joiner_id, 30).await;
    play_host_win(&mut host, &mut joiner).await;

    send(&mut host, &ClientMessage::Rematch).await;
    assert!(matches!(recv(&mut host).await, ServerMessage::RematchWaiting));

    send(&mut joiner, &ClientMessage::ReturnToLobby).await;
    assert_eq!(recv(&mut host).await, ServerMessage::OpponentLeft);

    // The finished game is gone; a further rematch request fails.
    send(&mut host, &ClientMessage::Rematch).await;
    assert!(matches!(recv(&mut host).await, ServerMessage::Error { .. }));
}
