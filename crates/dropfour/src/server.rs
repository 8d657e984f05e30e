//! `DropfourServer` builder and accept loop.
//!
//! This is the entry point for running a Dropfour server. It ties
//! together all the layers: transport → protocol → matchmaking →
//! sessions.

use std::sync::Arc;

use dropfour_game::{
    MatchResult, Matchmaker, RematchCoordinator, SessionConfig,
    SessionRegistry,
};
use dropfour_protocol::JsonCodec;
use dropfour_transport::WsListener;
use tokio::sync::{mpsc, Mutex};

use crate::handler::handle_connection;
use crate::stats::StatsSink;
use crate::DropfourError;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The three
/// lobby-level tables get their own locks; per-game state lives inside
/// the session actors and is never locked here.
pub(crate) struct ServerState<S: StatsSink> {
    pub(crate) matchmaker: Mutex<Matchmaker>,
    pub(crate) registry: Mutex<SessionRegistry>,
    pub(crate) rematch: Mutex<RematchCoordinator>,
    pub(crate) codec: JsonCodec,
    pub(crate) stats: S,
}

/// Builder for configuring and starting a Dropfour server.
///
/// # Example
///
/// ```rust,ignore
/// let server = DropfourServer::builder()
///     .bind("0.0.0.0:8080")
///     .build(MemoryStats::new())
///     .await?;
/// server.run().await
/// ```
pub struct DropfourServerBuilder {
    bind_addr: String,
    session_config: SessionConfig,
}

impl DropfourServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            session_config: SessionConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the session policy (timeout limit, bot pacing).
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Binds the listener and assembles the server around the given
    /// result sink.
    pub async fn build<S: StatsSink>(
        self,
        stats: S,
    ) -> Result<DropfourServer<S>, DropfourError> {
        let listener = WsListener::bind(&self.bind_addr).await?;

        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let state = Arc::new(ServerState {
            matchmaker: Mutex::new(Matchmaker::new()),
            registry: Mutex::new(SessionRegistry::new(
                self.session_config,
                results_tx,
            )),
            rematch: Mutex::new(RematchCoordinator::new()),
            codec: JsonCodec,
            stats,
        });

        spawn_results_pump(Arc::clone(&state), results_rx);

        Ok(DropfourServer { listener, state })
    }
}

impl Default for DropfourServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Consumes terminal session results and feeds them to the sink.
fn spawn_results_pump<S: StatsSink>(
    state: Arc<ServerState<S>>,
    mut results_rx: mpsc::UnboundedReceiver<MatchResult>,
) {
    tokio::spawn(async move {
        while let Some(result) = results_rx.recv().await {
            tracing::debug!(game_id = %result.game_id, "session result received");
            for (player, outcome) in result.outcomes {
                state.stats.record(player, outcome).await;
            }
        }
    });
}

/// A running Dropfour server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct DropfourServer<S: StatsSink> {
    listener: WsListener,
    state: Arc<ServerState<S>>,
}

impl<S: StatsSink> DropfourServer<S> {
    /// Creates a new builder.
    pub fn builder() -> DropfourServerBuilder {
        DropfourServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each
    /// one. Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), DropfourError> {
        tracing::info!("Dropfour server running");

        loop {
            match self.listener.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
