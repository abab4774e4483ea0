// Server configuration.
//
// `ServerConfig` is data-driven like the rest of the game: it can be loaded
// from a JSON file, and any field missing from the file keeps its default.
// Game balance lives in the nested `rules` table (`tile_duel_engine::GameRules`).
//
// Example file:
//
//   {
//     "port": 9000,
//     "tick_interval_ms": 500,
//     "rules": { "attack_threshold": 64 }
//   }

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tile_duel_engine::GameRules;

use crate::error::ServerError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to listen on.
    pub bind_host: String,
    /// Listen port. 0 lets the OS pick one (useful in tests).
    pub port: u16,
    /// Read timeout of each connection worker; also the unit of the idle
    /// attack timer.
    pub tick_interval_ms: u64,
    /// Seed for the shared tile generator. Random when absent.
    pub seed: Option<u64>,
    pub rules: GameRules,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".into(),
            port: 8080,
            tick_interval_ms: 1000,
            seed: None,
            rules: GameRules::default(),
        }
    }
}

impl ServerConfig {
    /// Load a config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ServerError> {
        let text = fs::read_to_string(path).map_err(|source| ServerError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ServerError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }

    /// Worker read timeout. Never zero, since a zero timeout is rejected by
    /// the socket API.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}
