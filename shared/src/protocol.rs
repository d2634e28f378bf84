//! Request/response messages exchanged over a client connection.

use crate::error::MatchError;
use crate::model::{BoxKind, Direction, PlayerId, Snapshot};
use serde::{Deserialize, Serialize};

/// Correlates a response with the request that caused it. The server echoes
/// the id it received; clients discard replies to requests they gave up on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub id: u64,
    pub body: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Request {
    Connect { name: String },
    GetState { player_id: PlayerId },
    Command { player_id: PlayerId, command: Command },
}

/// Player commands, each with its own payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// `sequence` must grow per player; repeats are ignored by the server.
    Move { sequence: u64, direction: Direction },
    Interact,
    Disconnect,
}

/// How the server treated a move. None of these are failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveOutcome {
    Applied,
    /// Target cell was a wall or held another player.
    Blocked,
    /// Sequence number already processed.
    Stale,
    /// Unknown, disconnected or dead player.
    Ignored,
    MatchOver,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Response {
    Connected {
        player_id: PlayerId,
        snapshot: Snapshot,
    },
    Moved {
        outcome: MoveOutcome,
        snapshot: Snapshot,
    },
    Revealed {
        kind: Option<BoxKind>,
        snapshot: Snapshot,
    },
    State {
        snapshot: Snapshot,
    },
    Ack,
    Refused {
        error: MatchError,
    },
}

impl Response {
    pub fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            Response::Connected { snapshot, .. }
            | Response::Moved { snapshot, .. }
            | Response::Revealed { snapshot, .. }
            | Response::State { snapshot } => Some(snapshot),
            Response::Ack | Response::Refused { .. } => None,
        }
    }
}
