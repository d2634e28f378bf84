//! # Treasure Hunt Server
//!
//! Authoritative server for the multiplayer treasure hunt. It owns the one
//! true copy of the match and answers client requests over TCP.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Match State
//! Players, hidden boxes, scores and the match phase live only here. Clients
//! send intentions (move, interact, leave) and receive full snapshots back;
//! they never dictate positions or outcomes.
//!
//! ### Command Ordering
//! Each player's moves carry a sequence number. The server records the
//! highest sequence it has evaluated per player and ignores anything at or
//! below it, so retried and reordered moves are harmless.
//!
//! ### Match Lifecycle
//! The first connection hides the boxes and starts the match. It ends with
//! a winner once every treasure is found, or with a collective loss once no
//! player is left alive and connected.
//!
//! ## Module Organization
//!
//! ### State Module (`state`)
//! The [`MatchState`] record and random box distribution.
//!
//! ### Game Module (`game`)
//! Match operations: connect, move, interact, disconnect and snapshots.
//!
//! ### Network Module (`network`)
//! The [`SyncServer`] accept loop and per-connection request handling.
//!
//! ## Concurrency
//!
//! Connection tasks share the match behind `Arc<RwLock<MatchState>>`. State
//! reads hold the lock shared; every command holds it exclusively for the
//! whole evaluation, so commands from different players are serialized.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::{ServerConfig, SyncServer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig {
//!         bind_addr: "127.0.0.1:8080".to_string(),
//!         ..ServerConfig::default()
//!     };
//!
//!     let server = SyncServer::from_config(&config).await?;
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod game;
pub mod network;
pub mod state;

pub use config::ServerConfig;
pub use error::ServerError;
pub use network::{dispatch, ShutdownHandle, SyncServer};
pub use state::{distribute_boxes, BoxQuotas, MatchState};

use log::{info, warn};

/// Runs the sync server until it fails or Ctrl+C is pressed.
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    info!("Loading map from {}", config.map_path.display());
    let server = SyncServer::from_config(&config).await?;
    let shutdown = server.shutdown_handle();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down gracefully..."),
            Err(e) => warn!("Could not listen for Ctrl+C: {}", e),
        }
        shutdown.shutdown();
    });

    server.run().await
}
