use shared::{MapLoadError, MatchError};
use thiserror::Error;

/// Startup failures of the sync server. All of these are fatal.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Map(#[from] MapLoadError),

    #[error("cannot start match: {0}")]
    Match(#[from] MatchError),
}
