//! WebSocket Host Server
//!
//! Accepts WebSocket connections, decodes binary [`Message`] envelopes and
//! feeds their intents to the session loop. Every batch the loop produces
//! is sent back to every connected socket as a `Response` envelope.
//!
//! A socket is bound to the identity of the first envelope it sends.
//! Anything that fails to decode is logged and skipped; the connection
//! stays open.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio_tungstenite::{accept_async, tungstenite::Message as WsMessage};
use futures_util::{SinkExt, StreamExt};
use tracing::{info, warn, error, debug, instrument};

use crate::core::identity::Identity;
use crate::game::engine::{EngineConfig, EngineError, GomokuEngine};
use crate::game::intent::{Intent, IntentError};
use crate::network::protocol::{now_millis, BatchState, Message, MessageKind, ProtocolError};
use crate::network::session::{HostSession, LogSettlement};

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Interval between engine steps.
    pub tick_interval: Duration,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Engine configuration.
    pub engine: EngineConfig,
    /// Session seed passed to `init`.
    pub seed: Vec<u8>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            tick_interval: Duration::from_millis(500),
            max_connections: 1000,
            engine: EngineConfig::default(),
            seed: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Read overrides from `GOMOKU_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("GOMOKU_BIND_ADDR") {
            config.bind_addr = addr
                .parse()
                .map_err(|_| ConfigError::invalid("GOMOKU_BIND_ADDR", &addr))?;
        }
        if let Some(ms) = lookup("GOMOKU_TICK_MS") {
            let ms: u64 = ms.parse().map_err(|_| ConfigError::invalid("GOMOKU_TICK_MS", &ms))?;
            if ms == 0 {
                return Err(ConfigError::invalid("GOMOKU_TICK_MS", "0"));
            }
            config.tick_interval = Duration::from_millis(ms);
        }
        if let Some(max) = lookup("GOMOKU_MAX_CONNECTIONS") {
            config.max_connections = max
                .parse()
                .map_err(|_| ConfigError::invalid("GOMOKU_MAX_CONNECTIONS", &max))?;
        }
        if let Some(size) = lookup("GOMOKU_GRID_SIZE") {
            config.engine.grid_size = size
                .parse()
                .map_err(|_| ConfigError::invalid("GOMOKU_GRID_SIZE", &size))?;
        }
        if let Some(seed) = lookup("GOMOKU_SEED") {
            let trimmed = seed.trim_start_matches("0x");
            config.seed = hex::decode(trimmed).map_err(|_| ConfigError::invalid("GOMOKU_SEED", &seed))?;
        }

        config.engine.validate()?;
        Ok(config)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable could not be parsed.
    #[error("Invalid value for {key}: {value:?}")]
    Invalid {
        /// Variable name
        key: &'static str,
        /// Raw value
        value: String,
    },

    /// Engine rejected the configuration.
    #[error("Engine config: {0}")]
    Engine(#[from] EngineError),
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str) -> Self {
        ConfigError::Invalid { key, value: value.to_string() }
    }
}

/// Server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Engine could not be built.
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Why an inbound frame was skipped.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Envelope did not decode.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Intent payload did not validate.
    #[error(transparent)]
    Intent(#[from] IntentError),

    /// Response envelope sent by a client.
    #[error("clients may only send requests")]
    NotARequest,

    /// Envelope identity differs from the socket's bound identity.
    #[error("socket bound to {bound}, envelope from {sender}")]
    IdentityChanged {
        /// Identity the socket is bound to
        bound: Identity,
        /// Identity on the envelope
        sender: Identity,
    },
}

/// Decode one inbound frame, binding the socket identity on first use.
pub fn decode_frame(data: &[u8], bound: &mut Option<Identity>) -> Result<Intent, FrameError> {
    let message = Message::from_bytes(data)?;
    if message.kind != MessageKind::Request {
        return Err(FrameError::NotARequest);
    }
    if let Some(identity) = bound.as_ref() {
        if identity != &message.identity {
            return Err(FrameError::IdentityChanged {
                bound: identity.clone(),
                sender: message.identity,
            });
        }
    }

    let intent = message.intent()?;
    if bound.is_none() {
        *bound = Some(message.identity);
    }
    Ok(intent)
}

/// Connected client state.
struct ConnectedClient {
    /// Identity, once the first envelope arrived.
    identity: Option<Identity>,
}

/// The host server.
pub struct GameServer {
    config: ServerConfig,
    clients: Arc<RwLock<BTreeMap<SocketAddr, ConnectedClient>>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a new server.
    pub fn new(config: ServerConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            clients: Arc::new(RwLock::new(BTreeMap::new())),
            shutdown_tx,
        }
    }

    /// Server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Signal the accept loop, session loop and connections to stop.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Number of connected sockets.
    pub async fn connection_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Identities bound to currently connected sockets.
    pub async fn bound_identities(&self) -> Vec<Identity> {
        self.clients
            .read()
            .await
            .values()
            .filter_map(|c| c.identity.clone())
            .collect()
    }

    /// Run the server.
    #[instrument(skip(self), fields(addr = %self.config.bind_addr))]
    pub async fn run(&self) -> Result<(), ServerError> {
        let engine = GomokuEngine::new(self.config.engine)?;
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!("Gomoku host listening on {}", self.config.bind_addr);

        let (intent_tx, intent_rx) = mpsc::channel::<Intent>(1024);
        let (batch_tx, _) = broadcast::channel::<Arc<BatchState>>(64);

        let session = HostSession::new(engine, &self.config.seed, Box::new(LogSettlement));
        let session_handle = tokio::spawn(session.run(
            intent_rx,
            batch_tx.clone(),
            self.config.tick_interval,
            self.shutdown_tx.subscribe(),
        ));

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            if self.connection_count().await >= self.config.max_connections {
                                warn!("Connection limit reached, rejecting {}", addr);
                                continue;
                            }

                            info!("New connection from {}", addr);
                            self.handle_connection(stream, addr, intent_tx.clone(), batch_tx.subscribe());
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received ({} connections)", self.connection_count().await);
                    for identity in self.bound_identities().await {
                        debug!("Disconnecting {}", identity.short());
                    }
                    break;
                }
            }
        }

        drop(intent_tx);
        if let Err(e) = session_handle.await {
            error!("Session task failed: {}", e);
        }
        Ok(())
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(
        &self,
        stream: TcpStream,
        addr: SocketAddr,
        intent_tx: mpsc::Sender<Intent>,
        mut batch_rx: broadcast::Receiver<Arc<BatchState>>,
    ) {
        let clients = self.clients.clone();
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
            let (frame_tx, mut frame_rx) = mpsc::channel::<Vec<u8>>(64);

            clients.write().await.insert(addr, ConnectedClient { identity: None });

            // Spawn frame sender task
            let sender_task = tokio::spawn(async move {
                while let Some(frame) = frame_rx.recv().await {
                    if ws_sender.send(WsMessage::Binary(frame)).await.is_err() {
                        break;
                    }
                }
            });

            let mut bound: Option<Identity> = None;

            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(WsMessage::Binary(data))) => {
                                let was_bound = bound.is_some();
                                match decode_frame(&data, &mut bound) {
                                    Ok(intent) => {
                                        if !was_bound {
                                            if let Some(identity) = &bound {
                                                debug!("Client {} bound to {}", addr, identity.short());
                                                if let Some(client) = clients.write().await.get_mut(&addr) {
                                                    client.identity = Some(identity.clone());
                                                }
                                            }
                                        }
                                        if intent_tx.send(intent).await.is_err() {
                                            warn!("Session loop gone, closing {}", addr);
                                            break;
                                        }
                                    }
                                    Err(e) => debug!("Skipped frame from {}: {}", addr, e),
                                }
                            }
                            Some(Ok(WsMessage::Text(_))) => {
                                debug!("Ignoring text frame from {}", addr);
                            }
                            Some(Ok(WsMessage::Close(_))) | None => {
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
                    batch = batch_rx.recv() => {
                        match batch {
                            Ok(batch) => {
                                let recipient = bound.clone().unwrap_or_else(|| Identity::new(""));
                                let frame = Message::response(recipient, &batch, now_millis())
                                    .and_then(|m| m.to_bytes());
                                match frame {
                                    Ok(frame) => {
                                        if frame_tx.send(frame).await.is_err() {
                                            break;
                                        }
                                    }
                                    Err(e) => error!("Failed to encode batch for {}: {}", addr, e),
                                }
                            }
                            Err(broadcast::error::RecvError::Lagged(n)) => {
                                warn!("Client {} lagged, {} batches dropped", addr, n);
                            }
                            Err(broadcast::error::RecvError::Closed) => break,
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }

            sender_task.abort();
            clients.write().await.remove(&addr);
            info!("Client {} cleaned up", addr);
        });
    }
}
