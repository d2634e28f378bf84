use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// The map file could not be opened or read.
#[derive(Debug, Error)]
#[error("failed to load map {path:?}: {source}")]
pub struct MapLoadError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Failures while moving a message across a stream.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("frame of {0} bytes exceeds the maximum frame size")]
    TooLarge(usize),
}

/// Engine failures that are reported back to the caller.
///
/// Benign races (stale sequence numbers, unknown players, blocked moves) are
/// not errors; they are encoded in [`crate::MoveOutcome`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum MatchError {
    #[error("match already finished")]
    MatchFinished,

    #[error("map has only {available} empty cells but {required} boxes are required")]
    InsufficientSpace { available: usize, required: usize },

    #[error("no free cell left to place a player")]
    NoFreeCell,
}
