//! Types shared by the treasure hunt server and client.
//!
//! Everything that crosses the wire lives here: the static map grid, the
//! player/box model, the request/response protocol and the length-prefixed
//! framing used on the TCP stream.

pub mod error;
pub mod framing;
pub mod map;
pub mod model;
pub mod protocol;

pub use error::{FrameError, MapLoadError, MatchError};
pub use framing::{read_frame, write_frame, MAX_FRAME_LEN};
pub use map::{Cell, Coordinate, Map};
pub use model::{
    BoxKind, Direction, MatchPhase, Player, PlayerColor, PlayerId, Snapshot, PALETTE,
    PLAYER_SYMBOL,
};
pub use protocol::{Command, Envelope, MoveOutcome, Request, Response};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAP_FILE: &str = "map.txt";
pub const DEFAULT_TREASURES: usize = 12;
pub const DEFAULT_TRAPS: usize = 4;
pub const DEFAULT_EMPTY_BOXES: usize = 4;
pub const SYNC_INTERVAL_MS: u64 = 100;
