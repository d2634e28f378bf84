//! Sync service: exposes the match over request/response TCP connections.

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::state::MatchState;
use log::{debug, error, info, warn};
use shared::{read_frame, write_frame, Command, Envelope, Map, PlayerId, Request, Response};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, RwLock};

/// Stops a running [`SyncServer`] and all of its connection tasks.
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }
}

/// Accepts client connections and serves each one on its own task.
///
/// All tasks share one [`MatchState`] behind a readers-writer lock: state
/// reads take it shared, commands take it exclusively. Responses are built
/// under the lock and written after it is released.
pub struct SyncServer {
    listener: TcpListener,
    state: Arc<RwLock<MatchState>>,
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl SyncServer {
    pub async fn bind(addr: &str, state: MatchState) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        info!("Sync server listening on {}", listener.local_addr()?);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            listener,
            state: Arc::new(RwLock::new(state)),
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
        })
    }

    /// Loads the map, prepares the match and binds the listener.
    pub async fn from_config(config: &ServerConfig) -> Result<Self, ServerError> {
        let map = Map::load(&config.map_path)?;
        let state = match config.seed {
            Some(seed) => MatchState::with_seed(map, config.quotas, seed)?,
            None => MatchState::new(map, config.quotas)?,
        };
        Self::bind(&config.bind_addr, state).await
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn state(&self) -> Arc<RwLock<MatchState>> {
        Arc::clone(&self.state)
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: Arc::clone(&self.shutdown_tx),
        }
    }

    /// Accept loop. Returns once shutdown is requested.
    pub async fn run(self) -> Result<(), ServerError> {
        let mut shutdown_rx = self.shutdown_rx.clone();

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            info!("New connection from {}", addr);
                            let state = Arc::clone(&self.state);
                            let shutdown_rx = self.shutdown_rx.clone();
                            tokio::spawn(handle_connection(stream, addr, state, shutdown_rx));
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = wait_for_shutdown(&mut shutdown_rx) => {
                    info!("Sync server shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}

async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Serves one client until it hangs up, sends garbage or the server stops.
///
/// Players that joined over this connection and never said goodbye are
/// disconnected when it closes.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<RwLock<MatchState>>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!("Could not disable Nagle for {}: {}", addr, e);
    }
    let (mut reader, mut writer) = stream.into_split();
    let mut joined: Vec<PlayerId> = Vec::new();

    loop {
        let frame = tokio::select! {
            frame = read_frame::<_, Envelope<Request>>(&mut reader) => frame,
            _ = wait_for_shutdown(&mut shutdown_rx) => break,
        };

        let Envelope { id, body: request } = match frame {
            Ok(Some(envelope)) => envelope,
            Ok(None) => {
                info!("Connection from {} closed", addr);
                break;
            }
            Err(e) => {
                warn!("Dropping connection from {}: {}", addr, e);
                break;
            }
        };

        if let Request::Command {
            player_id,
            command: Command::Disconnect,
        } = &request
        {
            joined.retain(|joined_id| joined_id != player_id);
        }

        let response = dispatch(&state, request).await;

        if let Response::Connected { player_id, .. } = &response {
            joined.push(*player_id);
        }

        if let Err(e) = write_frame(&mut writer, &Envelope { id, body: &response }).await {
            warn!("Failed to answer {}: {}", addr, e);
            break;
        }
    }

    if !joined.is_empty() {
        let mut state = state.write().await;
        for player_id in joined {
            if state.disconnect(player_id) {
                info!("Released player {} after {} went away", player_id, addr);
            }
        }
    }
}

/// Runs one request against the match and builds its response.
///
/// The lock is held only while the engine runs; nothing here performs I/O.
pub async fn dispatch(state: &RwLock<MatchState>, request: Request) -> Response {
    match request {
        Request::Connect { name } => {
            let result = state.write().await.connect(&name);
            match result {
                Ok((player_id, snapshot)) => Response::Connected {
                    player_id,
                    snapshot,
                },
                Err(error) => {
                    warn!("Refused connect from {}: {}", name, error);
                    Response::Refused { error }
                }
            }
        }

        Request::GetState { player_id } => {
            debug!("State requested by {}", player_id);
            let snapshot = state.read().await.snapshot();
            Response::State { snapshot }
        }

        Request::Command { player_id, command } => {
            let mut state = state.write().await;
            match command {
                Command::Move {
                    sequence,
                    direction,
                } => {
                    let (outcome, snapshot) = state.move_player(player_id, sequence, direction);
                    Response::Moved { outcome, snapshot }
                }
                Command::Interact => {
                    let (kind, snapshot) = state.interact(player_id);
                    Response::Revealed { kind, snapshot }
                }
                Command::Disconnect => {
                    state.disconnect(player_id);
                    Response::Ack
                }
            }
        }
    }
}
