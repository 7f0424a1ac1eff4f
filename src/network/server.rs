//! WebSocket Match Server
//!
//! Async WebSocket server for scorer connections. Each text frame is one
//! request and gets exactly one response on the same socket.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::time::interval;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, instrument, warn};

use crate::network::protocol::{ClientMessage, ServerMessage};
use crate::network::session::{SessionError, SessionManager, DEFAULT_MAX_MATCHES};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Close connections silent for this long.
    pub idle_timeout: Duration,
    /// Maximum live matches.
    pub max_matches: usize,
    /// Evict completed matches untouched for this long. `None` keeps them
    /// for the life of the process.
    pub completed_retention: Option<Duration>,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            max_connections: 1000,
            idle_timeout: Duration::from_secs(300),
            max_matches: DEFAULT_MAX_MATCHES,
            completed_retention: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `CRICKET_BIND_ADDR`, `CRICKET_MAX_CONNECTIONS`,
    /// `CRICKET_IDLE_TIMEOUT_SECS`, `CRICKET_MAX_MATCHES` and
    /// `CRICKET_COMPLETED_RETENTION_SECS`.
    pub fn from_env() -> Result<Self, GameServerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, GameServerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("CRICKET_BIND_ADDR") {
            config.bind_addr = parse_var("CRICKET_BIND_ADDR", &addr)?;
        }
        if let Some(max) = lookup("CRICKET_MAX_CONNECTIONS") {
            config.max_connections = parse_var("CRICKET_MAX_CONNECTIONS", &max)?;
        }
        if let Some(secs) = lookup("CRICKET_IDLE_TIMEOUT_SECS") {
            config.idle_timeout = Duration::from_secs(parse_var("CRICKET_IDLE_TIMEOUT_SECS", &secs)?);
        }
        if let Some(max) = lookup("CRICKET_MAX_MATCHES") {
            config.max_matches = parse_var("CRICKET_MAX_MATCHES", &max)?;
        }
        if let Some(secs) = lookup("CRICKET_COMPLETED_RETENTION_SECS") {
            config.completed_retention =
                Some(Duration::from_secs(parse_var("CRICKET_COMPLETED_RETENTION_SECS", &secs)?));
        }

        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, GameServerError> {
    value
        .trim()
        .parse()
        .map_err(|_| GameServerError::Config(format!("{} has invalid value {:?}", key, value)))
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Bad configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session error.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Connected client state.
struct ConnectedClient {
    /// Connection time.
    connected_at: Instant,
    /// Requests handled.
    requests: u64,
}

/// The match server.
pub struct GameServer {
    /// Server configuration.
    config: ServerConfig,
    /// Session manager.
    sessions: Arc<SessionManager>,
    /// Connected clients.
    clients: Arc<RwLock<BTreeMap<SocketAddr, ConnectedClient>>>,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a new server.
    pub fn new(config: ServerConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let sessions = Arc::new(SessionManager::new(config.max_matches));

        Self {
            config,
            sessions,
            clients: Arc::new(RwLock::new(BTreeMap::new())),
            shutdown_tx,
        }
    }

    /// Session manager shared with connections.
    pub fn sessions(&self) -> Arc<SessionManager> {
        self.sessions.clone()
    }

    /// Bind and run the server.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Run the server on an already-bound listener.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), GameServerError> {
        info!("Match server listening on {}", listener.local_addr()?);

        let cleanup_handle = self.config.completed_retention.map(|retention| {
            let cleanup_sessions = self.sessions.clone();
            info!("Evicting completed matches after {:?}", retention);
            tokio::spawn(async move {
                Self::run_cleanup_loop(cleanup_sessions, retention).await;
            })
        });

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let clients_count = self.clients.read().await.len();
                            if clients_count >= self.config.max_connections {
                                warn!("Connection limit reached, rejecting {}", addr);
                                continue;
                            }

                            info!("New connection from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        if let Some(handle) = cleanup_handle {
            handle.abort();
        }
        Ok(())
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let clients = self.clients.clone();
        let sessions = self.sessions.clone();
        let idle_timeout = self.config.idle_timeout;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("WebSocket handshake failed for {}: {}", addr, e);
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(64);

            // Register client
            {
                let mut clients = clients.write().await;
                clients.insert(addr, ConnectedClient {
                    connected_at: Instant::now(),
                    requests: 0,
                });
            }

            // Spawn message sender task
            let sender_task = tokio::spawn(async move {
                while let Some(msg) = msg_rx.recv().await {
                    let text = match msg.to_json() {
                        Ok(t) => t,
                        Err(e) => {
                            error!("Failed to serialize message: {}", e);
                            continue;
                        }
                    };
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
            });

            // Handle incoming messages
            loop {
                tokio::select! {
                    msg = tokio::time::timeout(idle_timeout, ws_receiver.next()) => {
                        let msg = match msg {
                            Ok(msg) => msg,
                            Err(_) => {
                                info!("Closing idle client {}", addr);
                                break;
                            }
                        };
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                let response = match ClientMessage::from_json(&text) {
                                    Ok(request) => dispatch(&sessions, request).await,
                                    Err(e) => {
                                        debug!("Invalid message from {}: {}", addr, e);
                                        ServerMessage::invalid_input(format!("Invalid message format: {}", e))
                                    }
                                };

                                if let Some(client) = clients.write().await.get_mut(&addr) {
                                    client.requests += 1;
                                }

                                if msg_tx.send(response).await.is_err() {
                                    break;
                                }
                            }
                            Some(Ok(Message::Binary(_))) => {
                                let _ = msg_tx
                                    .send(ServerMessage::invalid_input("Binary frames are not supported"))
                                    .await;
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("Client {} disconnected", addr);
                                break;
                            }
                            Some(Err(e)) => {
                                error!("WebSocket error for {}: {}", addr, e);
                                break;
                            }
                            _ => {}
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        let _ = msg_tx.send(ServerMessage::Shutdown {
                            reason: "Server shutting down".to_string(),
                        }).await;
                        break;
                    }
                }
            }

            // Let queued responses drain before closing.
            drop(msg_tx);
            let _ = sender_task.await;

            if let Some(client) = clients.write().await.remove(&addr) {
                info!(
                    "Client {} cleaned up after {} requests in {:?}",
                    addr,
                    client.requests,
                    client.connected_at.elapsed()
                );
            }
        });
    }

    /// Periodic cleanup of completed matches.
    async fn run_cleanup_loop(sessions: Arc<SessionManager>, retention: Duration) {
        let mut interval = interval(Duration::from_secs(60));
        let retention = chrono::Duration::from_std(retention).unwrap_or(chrono::Duration::hours(1));

        loop {
            interval.tick().await;
            let removed = sessions.cleanup(retention).await;
            if removed > 0 {
                info!("Removed {} completed matches", removed);
            }
        }
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get active connection count.
    pub async fn connection_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Get active session count.
    pub async fn session_count(&self) -> usize {
        self.sessions.session_count().await
    }
}

/// Answer one request.
pub async fn dispatch(sessions: &SessionManager, request: ClientMessage) -> ServerMessage {
    let request = match request.into_write() {
        Ok(write) => {
            let name = write.command.name();
            debug!(match_id = %write.match_id, command = name, "write");
            return match sessions
                .apply(&write.match_id, write.command, write.expected_version)
                .await
            {
                Ok(update) => {
                    if update.match_completed {
                        info!(match_id = %update.match_id, version = update.version, "match completed");
                    }
                    ServerMessage::Applied(update)
                }
                Err(e) => {
                    warn!(match_id = %write.match_id, command = name, "rejected: {}", e);
                    ServerMessage::error(&e)
                }
            };
        }
        Err(read) => read,
    };

    match request {
        ClientMessage::CreateMatch { setup } => match sessions.create_match(setup).await {
            Ok((match_id, scoreboard)) => {
                info!(match_id = %match_id, "match created");
                ServerMessage::MatchCreated {
                    match_id,
                    version: 0,
                    scoreboard: (*scoreboard).clone(),
                }
            }
            Err(e) => {
                warn!("create_match rejected: {}", e);
                ServerMessage::error(&e)
            }
        },
        ClientMessage::ValidateNextBowler { match_id, bowler } => {
            match sessions.validate_next_bowler(&match_id, &bowler).await {
                Ok(check) => ServerMessage::BowlerValidated { match_id, check },
                Err(e) => {
                    debug!(match_id = %match_id, "bowler {} rejected: {}", bowler, e);
                    ServerMessage::error(&e)
                }
            }
        }
        ClientMessage::GetScoreboard { match_id } => match sessions.scoreboard(&match_id).await {
            Ok(scoreboard) => ServerMessage::Scoreboard { scoreboard: (*scoreboard).clone() },
            Err(e) => ServerMessage::error(&e),
        },
        ClientMessage::GetMatchDetails { match_id } => match sessions.details(&match_id).await {
            Ok(details) => ServerMessage::MatchDetails(Box::new(details)),
            Err(e) => ServerMessage::error(&e),
        },
        ClientMessage::Ping { timestamp } => ServerMessage::Pong {
            timestamp,
            server_time: chrono::Utc::now().timestamp_millis().max(0) as u64,
        },
        // Writes were handled above.
        other => {
            error!("Unroutable request: {:?}", other);
            ServerMessage::invalid_input("Unroutable request")
        }
    }
}
