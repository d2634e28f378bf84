//! # Treasure Hunt Client
//!
//! Terminal client for the multiplayer treasure hunt. It keeps a local copy
//! of the match, moves the player optimistically and conforms to whatever
//! the server answers.
//!
//! ## Architecture Overview
//!
//! ### Optimistic Movement
//! A move is drawn immediately on the local view, then sent to the server.
//! The server's snapshot replaces the view when the reply arrives, so a
//! rejected move simply snaps back.
//!
//! ### Background Sync
//! A sync loop polls the full state at a fixed interval (100 ms by default)
//! so that other players' moves and reveals show up without input. It is
//! started and stopped explicitly and never outlives its [`Reconciler`].
//!
//! ### Request Timeouts
//! Every request is bounded by a timeout. A timed-out request is a
//! transient error; its late reply is recognised by id and discarded.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! The [`LocalView`]: last snapshot, local prediction, status line.
//!
//! ### Input Module (`input`)
//! Line-based key translation: `w/a/s/d` move, `e` opens a box, `q` quits.
//!
//! ### Network Module (`network`)
//! The [`RpcClient`] connection with per-call timeout and simulated latency.
//!
//! ### Reconciler Module (`reconciler`)
//! Ties the connection, the view and a [`Render`] implementation together.
//!
//! ### Rendering Module (`rendering`)
//! ANSI terminal drawing of the grid, players, boxes and scores.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::{Reconciler, RpcClient, TerminalRenderer};
//! use shared::Direction;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let rpc = RpcClient::connect("127.0.0.1:8080", Duration::from_secs(2)).await?;
//!     let mut reconciler = Reconciler::connect(
//!         rpc,
//!         "ana",
//!         TerminalRenderer::new(),
//!         Duration::from_millis(100),
//!     )
//!     .await?;
//!
//!     reconciler.start_sync();
//!     reconciler.submit_move(Direction::Right).await?;
//!     reconciler.interact().await?;
//!     reconciler.disconnect().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod game;
pub mod input;
pub mod network;
pub mod reconciler;
pub mod rendering;

pub use config::ClientConfig;
pub use error::ClientError;
pub use game::LocalView;
pub use input::{parse_line, Intent};
pub use network::RpcClient;
pub use reconciler::{Reconciler, Render};
pub use rendering::{render_frame, TerminalRenderer};

use log::{info, warn};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{interval, sleep, MissedTickBehavior};

/// How long the final screen stays up after the match ends.
const GAME_OVER_LINGER: Duration = Duration::from_secs(5);

/// Joins the match and plays it from stdin until quit or game over.
pub async fn run(config: ClientConfig) -> Result<(), ClientError> {
    info!("Connecting to: {}", config.server_addr);
    let mut rpc = RpcClient::connect(&config.server_addr, config.request_timeout).await?;
    if !config.fake_ping.is_zero() {
        info!("Simulating {}ms latency", config.fake_ping.as_millis());
        rpc = rpc.with_fake_ping(config.fake_ping);
    }

    let mut reconciler = Reconciler::connect(
        rpc,
        &config.name,
        TerminalRenderer::new(),
        config.sync_interval,
    )
    .await?;
    reconciler.start_sync();
    info!("Controls: W/A/S/D + Enter to move, E to open a box, Q to quit");

    let view = reconciler.view();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut watchdog = interval(Duration::from_millis(250));
    watchdog.set_missed_tick_behavior(MissedTickBehavior::Skip);

    'input: loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Failed to read input: {}", e);
                        break;
                    }
                };

                for intent in parse_line(&line) {
                    let result = match intent {
                        Intent::Move(direction) => reconciler.submit_move(direction).await.map(|_| ()),
                        Intent::Interact => reconciler.interact().await.map(|_| ()),
                        Intent::Quit => break 'input,
                    };

                    match result {
                        Ok(()) => {}
                        Err(e) if e.is_transient() => warn!("Request failed: {}", e),
                        Err(e) => return Err(e),
                    }
                }
            }

            _ = watchdog.tick() => {}
        }

        if let Some(message) = view.read().await.game_over() {
            info!("{}", message);
            sleep(GAME_OVER_LINGER).await;
            break;
        }
    }

    if let Err(e) = reconciler.disconnect().await {
        warn!("Disconnect failed: {}", e);
    }

    Ok(())
}
