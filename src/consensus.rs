//! Longest-valid-chain fork choice
//!
//! Every registered peer is asked for its chain. The longest chain that is
//! strictly longer than ours and passes validation replaces the local one.
//! Difficulty is uniform across the network, so length stands in for work.

use crate::blockchain::{validate_chain, Block};
use crate::miner::ProofOfWork;
use crate::network::{ChainResponse, PeerTransport};
use crate::node::LedgerState;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Chain offered by a peer that survived fetching.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub peer: String,
    pub response: ChainResponse,
}

/// Consensus engine for selecting the canonical chain
pub struct Consensus;

impl Consensus {
    /// Pick the longest valid candidate strictly longer than `local_length`.
    ///
    /// Candidates whose reported length disagrees with the chain they delivered
    /// are malformed and ignored. Ties never displace the current best.
    pub fn select_longest(
        local_length: usize,
        candidates: Vec<Candidate>,
        pow: &ProofOfWork,
    ) -> Option<Vec<Block>> {
        let mut best_length = local_length;
        let mut best_chain = None;

        for Candidate { peer, response } in candidates {
            if response.length != response.chain.len() {
                warn!(
                    peer = %peer,
                    reported = response.length,
                    actual = response.chain.len(),
                    "peer reported a length that does not match its chain"
                );
                continue;
            }

            if response.length <= best_length {
                debug!(peer = %peer, length = response.length, best_length, "peer chain not longer");
                continue;
            }

            match validate_chain(&response.chain, pow) {
                Ok(()) => {
                    best_length = response.length;
                    best_chain = Some(response.chain);
                }
                Err(e) => warn!(peer = %peer, error = %e, "rejecting invalid peer chain"),
            }
        }

        best_chain
    }

    /// Fetch every peer's chain concurrently, each bounded by `timeout`.
    /// Failing or slow peers are logged and left out.
    pub async fn fetch_candidates<T>(
        transport: &T,
        peers: Vec<String>,
        timeout: Duration,
    ) -> Vec<Candidate>
    where
        T: PeerTransport + Clone + 'static,
    {
        let mut tasks = JoinSet::new();
        for peer in peers {
            let transport = transport.clone();
            tasks.spawn(async move {
                let result = tokio::time::timeout(timeout, transport.fetch_chain(&peer)).await;
                (peer, result)
            });
        }

        let mut candidates = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((peer, Ok(Ok(response)))) => candidates.push(Candidate { peer, response }),
                Ok((peer, Ok(Err(e)))) => warn!(peer = %peer, error = %e, "skipping peer"),
                Ok((peer, Err(_))) => {
                    warn!(peer = %peer, timeout_ms = timeout.as_millis() as u64, "peer timed out")
                }
                Err(e) => warn!(error = %e, "peer fetch task failed"),
            }
        }
        candidates
    }

    /// Reconcile the local chain with every registered peer.
    ///
    /// Peers are contacted without holding `state`; the lock is only taken to
    /// snapshot the registry and for the final compare-and-swap, which checks
    /// the local length again at that point. Returns true iff the local chain
    /// was replaced.
    pub async fn resolve<T>(
        state: &RwLock<LedgerState>,
        transport: &T,
        pow: &ProofOfWork,
        timeout: Duration,
    ) -> bool
    where
        T: PeerTransport + Clone + 'static,
    {
        let (peers, local_length) = {
            let state = state.read().await;
            (state.registry.list(), state.blockchain.len())
        };

        if peers.is_empty() {
            debug!("no peers registered; local chain stands");
            return false;
        }

        let candidates = Self::fetch_candidates(transport, peers, timeout).await;
        let Some(best) = Self::select_longest(local_length, candidates, pow) else {
            return false;
        };

        let mut state = state.write().await;
        let current_length = state.blockchain.len();
        if best.len() <= current_length {
            info!(
                candidate = best.len(),
                local = current_length,
                "local chain grew while peers were consulted; keeping it"
            );
            return false;
        }

        let new_length = best.len();
        match state.blockchain.replace_chain(best) {
            Ok(()) => {
                info!(old_length = current_length, new_length, "replaced local chain");
                true
            }
            Err(e) => {
                warn!(error = %e, "could not adopt peer chain");
                false
            }
        }
    }
}
