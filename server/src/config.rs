use crate::state::BoxQuotas;
use serde::{Deserialize, Serialize};
use shared::{DEFAULT_MAP_FILE, DEFAULT_PORT};
use std::path::PathBuf;

/// Everything the sync server needs to start a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub map_path: PathBuf,
    pub quotas: BoxQuotas,
    /// Fixes the box layout. `None` draws one from system entropy.
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{}", DEFAULT_PORT),
            map_path: PathBuf::from(DEFAULT_MAP_FILE),
            quotas: BoxQuotas::default(),
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.map_path, PathBuf::from("map.txt"));
        assert_eq!(config.quotas.total(), 20);
        assert_eq!(config.seed, None);
    }
}
