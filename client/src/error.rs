use shared::{FrameError, MatchError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to connect to {addr}: {source}")]
    Connection {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("transport error: {0}")]
    Transport(#[from] FrameError),

    #[error("request timed out")]
    Timeout,

    #[error("connection closed by server")]
    Closed,

    #[error("server refused: {0}")]
    Refused(MatchError),

    #[error("unexpected response from server")]
    UnexpectedResponse,
}

impl ClientError {
    /// Errors after which the next request may still succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::Timeout | ClientError::UnexpectedResponse)
    }
}
