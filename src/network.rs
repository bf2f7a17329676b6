//! Peer bookkeeping and transport
//!
//! - [`NodeRegistry`] keeps the set of known peers as normalized `host:port` strings.
//! - [`PeerTransport`] is the seam through which peer chains are fetched;
//!   [`HttpTransport`] implements it against a peer's `GET /chain` endpoint.

use crate::blockchain::Block;
use crate::error::{ChainError, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

/// Body of `GET /chain`, served locally and fetched from peers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainResponse {
    pub chain: Vec<Block>,
    pub length: usize,
}

impl ChainResponse {
    pub fn new(chain: Vec<Block>) -> Self {
        let length = chain.len();
        Self { chain, length }
    }
}

/// Normalize a peer address to `host:port`.
///
/// Accepts full URLs (`http://10.0.0.2:5000/some/path`) as well as bare
/// `host:port` pairs; scheme, credentials and path are discarded. URLs with a
/// known scheme and no port get the scheme's default port.
pub fn normalize_address(address: &str) -> Result<String> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(ChainError::InvalidPeerAddress("empty address".to_string()));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    let url = Url::parse(&with_scheme)
        .map_err(|e| ChainError::InvalidPeerAddress(format!("{}: {}", trimmed, e)))?;

    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| ChainError::InvalidPeerAddress(format!("{}: missing host", trimmed)))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| ChainError::InvalidPeerAddress(format!("{}: missing port", trimmed)))?;

    Ok(format!("{}:{}", host, port))
}

/// Set of peers this node reconciles with.
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    nodes: HashSet<String>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peer, returning its normalized form. Registering a known peer is a no-op.
    pub fn register(&mut self, address: &str) -> Result<String> {
        let node = normalize_address(address)?;
        if self.nodes.insert(node.clone()) {
            tracing::info!(peer = %node, "registered peer");
        }
        Ok(node)
    }

    /// Membership snapshot, sorted for stable rendering.
    pub fn list(&self) -> Vec<String> {
        let mut nodes: Vec<String> = self.nodes.iter().cloned().collect();
        nodes.sort();
        nodes
    }

    pub fn contains(&self, address: &str) -> bool {
        normalize_address(address)
            .map(|node| self.nodes.contains(&node))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Fetches a peer's full chain.
pub trait PeerTransport: Send + Sync {
    fn fetch_chain(&self, peer: &str) -> impl Future<Output = Result<ChainResponse>> + Send;
}

/// [`PeerTransport`] over plain HTTP, requesting `http://{peer}/chain`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl PeerTransport for HttpTransport {
    async fn fetch_chain(&self, peer: &str) -> Result<ChainResponse> {
        let url = format!("http://{}/chain", peer);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChainError::PeerResponse(format!(
                "{} answered {}",
                peer, status
            )));
        }

        Ok(response.json::<ChainResponse>().await?)
    }
}
