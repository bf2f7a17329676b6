//! Configuration management for powledger

use crate::error::{ChainError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// File consulted by [`load_config`] when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Longest leading-zero run accepted; a SHA-256 hex digest has 64 characters.
pub const MAX_DIFFICULTY: usize = 64;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub network: NetworkConfig,
    pub miner: MinerConfig,
    pub consensus: ConsensusConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub host: String,
    pub port: u16,
    /// Peers registered at startup, in any form accepted by `NodeRegistry::register`.
    pub bootstrap_peers: Vec<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            bootstrap_peers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    /// Number of leading hex zeros a proof hash must carry.
    pub difficulty: usize,
    /// Amount credited to this node by the reward transaction of every mined block.
    pub reward: f64,
    /// Refuse to mine a block whose only transaction would be the reward.
    pub require_transactions: bool,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
            reward: default_reward(),
            require_transactions: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    pub peer_timeout_secs: u64,
    /// Run one resolution round after the bootstrap peers are registered.
    pub resolve_on_start: bool,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            peer_timeout_secs: default_peer_timeout(),
            resolve_on_start: true,
        }
    }
}

impl Config {
    /// Validate critical values
    pub fn validate(&self) -> Result<()> {
        if self.miner.difficulty == 0 || self.miner.difficulty > MAX_DIFFICULTY {
            return Err(ChainError::ConfigError(format!(
                "miner.difficulty must be between 1 and {}, got {}",
                MAX_DIFFICULTY, self.miner.difficulty
            )));
        }

        if !self.miner.reward.is_finite() {
            return Err(ChainError::ConfigError(
                "miner.reward must be a finite number".to_string(),
            ));
        }

        if self.consensus.peer_timeout_secs == 0 {
            return Err(ChainError::ConfigError(
                "consensus.peer_timeout_secs must be greater than zero".to_string(),
            ));
        }

        if self.network.host.is_empty() {
            return Err(ChainError::ConfigError("network.host must be set".to_string()));
        }

        Ok(())
    }
}

/// Load `config.toml` from the working directory, falling back to defaults when it is absent.
pub fn load_config() -> Result<Config> {
    load_config_from(Path::new(DEFAULT_CONFIG_FILE))
}

/// Load configuration from `path`. A missing or empty file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config> {
    let config_str = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    let config: Config = if config_str.trim().is_empty() {
        Config::default()
    } else {
        toml::from_str(&config_str)?
    };

    config.validate()?;
    Ok(config)
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_difficulty() -> usize {
    4
}

fn default_reward() -> f64 {
    1.0
}

fn default_peer_timeout() -> u64 {
    5
}
