//! Error types for powledger

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Chain is empty")]
    EmptyChain,
    #[error("Invalid chain: {0}")]
    InvalidChain(String),
    #[error("Invalid peer address: {0}")]
    InvalidPeerAddress(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Unexpected peer response: {0}")]
    PeerResponse(String),
    #[error("No pending transactions to include in a block")]
    NoPendingTransactions,
    #[error("Background task failed: {0}")]
    TaskFailed(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<reqwest::Error> for ChainError {
    fn from(err: reqwest::Error) -> Self {
        ChainError::NetworkError(err.to_string())
    }
}

impl From<toml::de::Error> for ChainError {
    fn from(err: toml::de::Error) -> Self {
        ChainError::ConfigError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
