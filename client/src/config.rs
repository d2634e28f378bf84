use shared::{DEFAULT_PORT, SYNC_INTERVAL_MS};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub server_addr: String,
    pub name: String,
    /// How often the sync loop polls the full match state.
    pub sync_interval: Duration,
    /// Upper bound on every request, including the initial dial.
    pub request_timeout: Duration,
    /// Artificial round-trip latency, for trying out the reconciler.
    pub fake_ping: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: format!("127.0.0.1:{}", DEFAULT_PORT),
            name: "player".to_string(),
            sync_interval: Duration::from_millis(SYNC_INTERVAL_MS),
            request_timeout: Duration::from_secs(2),
            fake_ping: Duration::ZERO,
        }
    }
}
