//! WebSocket Game Server
//!
//! Accepts WebSocket connections, routes every client message through the
//! match directory and answers with that client's snapshot. A background
//! task drives the simulation at a fixed interval; another reports store
//! usage when it changes.
//!
//! ```text
//!   client ──frame──▶ connection task ──▶ MatchDirectory::handle_input
//!      ▲                                          │
//!      └──── sender task ◀── mpsc ◀── snapshot ───┘
//!
//!   tick task ──every tick_ms──▶ MatchDirectory::tick_all
//! ```

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::time::{interval, MissedTickBehavior};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::core::clock::{Clock, SystemClock};
use crate::network::protocol::{ClientInput, ClientMessage, ServerMessage};
use crate::network::session::{DirectoryError, MatchDirectory, UserId};
use crate::storage::KeyValueStore;

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Match directory error.
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),
}

/// Connected client state.
struct ConnectedClient {
    /// Remote address.
    addr: SocketAddr,
    /// Connection time.
    connected_at: Instant,
}

/// The game server.
pub struct GameServer {
    /// Server configuration.
    config: ServerConfig,
    /// Live matches.
    directory: Arc<MatchDirectory>,
    /// Shared key/value store.
    store: Arc<KeyValueStore>,
    /// Connected clients.
    clients: Arc<RwLock<BTreeMap<UserId, ConnectedClient>>>,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a server on the system clock.
    pub fn new(config: ServerConfig, store: KeyValueStore) -> Self {
        Self::with_clock(config, store, Arc::new(SystemClock))
    }

    /// Create a server on a given clock.
    pub fn with_clock(config: ServerConfig, store: KeyValueStore, clock: Arc<dyn Clock>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let directory = MatchDirectory::new(config.session_config(), clock);

        Self {
            config,
            directory: Arc::new(directory),
            store: Arc::new(store),
            clients: Arc::new(RwLock::new(BTreeMap::new())),
            shutdown_tx,
        }
    }

    /// Match directory.
    pub fn directory(&self) -> &Arc<MatchDirectory> {
        &self.directory
    }

    /// Shared store.
    pub fn store(&self) -> &Arc<KeyValueStore> {
        &self.store
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> Result<TcpListener, GameServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!("Game server listening on {}", listener.local_addr()?);
        Ok(listener)
    }

    /// Bind and serve until shutdown.
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    /// Serve connections on `listener` until shutdown.
    #[instrument(skip(self, listener))]
    pub async fn serve(&self, listener: TcpListener) -> Result<(), GameServerError> {
        let tick_directory = self.directory.clone();
        let tick_interval = self.config.tick_interval();
        let tick_shutdown = self.shutdown_tx.subscribe();
        let tick_handle = tokio::spawn(async move {
            Self::run_tick_loop(tick_directory, tick_interval, tick_shutdown).await;
        });

        let monitor_store = self.store.clone();
        let monitor_interval = self.config.store_log_interval;
        let monitor_handle = tokio::spawn(async move {
            Self::run_store_monitor(monitor_store, monitor_interval).await;
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

        monitor_handle.abort();
        let _ = tick_handle.await;

        Ok(())
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let clients = self.clients.clone();
        let directory = self.directory.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("WebSocket handshake failed for {}: {}", addr, e);
                    return;
                }
            };

            let user_id = Uuid::new_v4();
            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(64);

            clients.write().await.insert(user_id, ConnectedClient {
                addr,
                connected_at: Instant::now(),
            });

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

            match directory.connect(user_id).await {
                Ok(snapshot) => {
                    let _ = msg_tx.send(ServerMessage::Update(snapshot)).await;
                }
                Err(e) => {
                    error!("Could not admit {} from {}: {}", user_id, addr, e);
                    sender_task.abort();
                    clients.write().await.remove(&user_id);
                    return;
                }
            }

            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                match ClientMessage::from_json(&text) {
                                    Ok(ClientMessage::Update(input)) => {
                                        Self::handle_update(&directory, user_id, &input, &msg_tx).await;
                                    }
                                    Err(e) => {
                                        debug!("Invalid message from {}: {}", addr, e);
                                    }
                                }
                            }
                            Some(Ok(Message::Binary(data))) => {
                                match ClientInput::from_bytes(&data) {
                                    Ok(input) => {
                                        Self::handle_update(&directory, user_id, &input, &msg_tx).await;
                                    }
                                    Err(e) => {
                                        debug!("Invalid binary message from {}: {}", addr, e);
                                    }
                                }
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
                        break;
                    }
                }
            }

            sender_task.abort();
            directory.disconnect(user_id).await;

            if let Some(client) = clients.write().await.remove(&user_id) {
                info!(
                    "Client {} ({}) cleaned up after {:.1}s",
                    user_id,
                    client.addr,
                    client.connected_at.elapsed().as_secs_f64()
                );
            }
        });
    }

    /// Apply one input and reply with the sender's snapshot.
    async fn handle_update(
        directory: &MatchDirectory,
        user_id: UserId,
        input: &ClientInput,
        sender: &mpsc::Sender<ServerMessage>,
    ) {
        match directory.handle_input(user_id, input).await {
            Ok(Some(snapshot)) => {
                let _ = sender.send(ServerMessage::Update(snapshot)).await;
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Input from {} failed: {}", user_id, e);
            }
        }
    }

    /// Run every match at a fixed interval.
    async fn run_tick_loop(
        directory: Arc<MatchDirectory>,
        every: Duration,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    directory.tick_all().await;
                }
                _ = shutdown_rx.recv() => {
                    break;
                }
            }
        }
    }

    /// Log store usage whenever the percentage changes.
    async fn run_store_monitor(store: Arc<KeyValueStore>, every: Duration) {
        let mut ticker = interval(every);
        let mut last_pct = None;

        loop {
            ticker.tick().await;

            let size = store.size().await;
            let pct = store.usage_percent().await;
            if last_pct != Some(pct) {
                info!("Storage: {} byte / {:.2}%", size, pct);
                last_pct = Some(pct);
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

    /// Get live match count, lobby included.
    pub async fn match_count(&self) -> usize {
        self.directory.match_count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::vec3::Vec3;
    use crate::game::entity::EntityType;
    use crate::network::protocol::{ActionRecord, GameStateRecord};
    use tokio_tungstenite::connect_async;

    fn test_config() -> ServerConfig {
        ServerConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            bots: 0,
            ..Default::default()
        }
    }

    fn snapshot_of(msg: Message) -> GameStateRecord {
        let text = msg.into_text().unwrap();
        match ServerMessage::from_json(&text).unwrap() {
            ServerMessage::Update(record) => record,
        }
    }

    #[tokio::test]
    async fn test_server_creation() {
        let server = GameServer::new(test_config(), KeyValueStore::default());

        assert_eq!(server.connection_count().await, 0);
        assert_eq!(server.match_count().await, 0);
        assert_eq!(server.store().size().await, 0);
    }

    #[tokio::test]
    async fn test_server_shutdown() {
        let server = Arc::new(GameServer::new(test_config(), KeyValueStore::default()));
        let listener = server.bind().await.unwrap();

        let running = server.clone();
        let handle = tokio::spawn(async move { running.serve(listener).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        server.shutdown();

        let result = tokio::time::timeout(Duration::from_secs(2), handle).await.unwrap();
        assert!(result.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_connect_join_and_shoot() {
        let clock = Arc::new(ManualClock::new(1000.0));
        let server = Arc::new(GameServer::with_clock(
            test_config(),
            KeyValueStore::default(),
            clock.clone(),
        ));
        let listener = server.bind().await.unwrap();
        let addr = listener.local_addr().unwrap();

        let running = server.clone();
        tokio::spawn(async move { running.serve(listener).await });

        let (mut ws, _) = connect_async(format!("ws://{}", addr)).await.unwrap();

        let first = snapshot_of(ws.next().await.unwrap().unwrap());
        assert_eq!(first.game_id, 0);
        assert_eq!(first.start_time, 0.0);
        assert!(first
            .entities
            .iter()
            .any(|e| e.entity_id == Some(first.current_player_id)));

        let join = ClientMessage::Update(ClientInput {
            x: Some(25.0),
            y: Some(0.0),
            z: Some(25.0),
            actions: vec![ActionRecord::join()],
            ..Default::default()
        });
        ws.send(Message::Text(join.to_json().unwrap())).await.unwrap();

        let joined = snapshot_of(ws.next().await.unwrap().unwrap());
        assert_eq!(joined.game_id, 1);
        assert_eq!(joined.start_time, 1030.0);

        // Binary frames carry the same input.
        let shoot = ClientInput {
            x: Some(25.0),
            y: Some(0.0),
            z: Some(25.0),
            actions: vec![ActionRecord::shoot(Vec3::new(1.0, 0.0, 0.0))],
            ..Default::default()
        };
        ws.send(Message::Binary(shoot.to_bytes().unwrap())).await.unwrap();

        let shot = snapshot_of(ws.next().await.unwrap().unwrap());
        assert_eq!(shot.game_id, 1);
        assert_eq!(shot.entities.iter().filter(|e| e.entity_type == EntityType::Bullet).count(), 1);
        assert_eq!(server.connection_count().await, 1);

        ws.close(None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(server.connection_count().await, 0);
        assert_eq!(server.directory().user_count().await, 0);

        server.shutdown();
    }
}
