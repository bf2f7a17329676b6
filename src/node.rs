//! Node service: the shared ledger state plus everything a request handler needs.
//!
//! Chain, pending pool and peer registry live behind one `RwLock`; every
//! mutation takes its write side. Proof-of-work and peer fetches run without
//! holding it.

use crate::blockchain::{Block, Blockchain};
use crate::config::Config;
use crate::consensus::Consensus;
use crate::crypto::generate_node_identifier;
use crate::error::{ChainError, Result};
use crate::miner::ProofOfWork;
use crate::network::{normalize_address, ChainResponse, HttpTransport, NodeRegistry};
use crate::transaction::{Transaction, REWARD_SENDER};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Everything guarded by the node's single exclusive section.
#[derive(Debug, Default)]
pub struct LedgerState {
    pub blockchain: Blockchain,
    pub registry: NodeRegistry,
}

impl LedgerState {
    pub fn new(blockchain: Blockchain) -> Self {
        Self {
            blockchain,
            registry: NodeRegistry::new(),
        }
    }
}

#[derive(Clone)]
pub struct Node {
    config: Arc<Config>,
    identifier: Arc<str>,
    pow: ProofOfWork,
    state: Arc<RwLock<LedgerState>>,
    transport: HttpTransport,
    /// Bumped whenever the chain tail changes; running proof searches poll it.
    tail_epoch: Arc<AtomicU64>,
    blocks_mined: Arc<AtomicU64>,
}

impl Node {
    /// Create a node with a fresh genesis chain and a random identity.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_identifier(config, generate_node_identifier())
    }

    pub fn with_identifier(config: Config, identifier: impl Into<String>) -> Result<Self> {
        config.validate()?;
        let transport =
            HttpTransport::new(Duration::from_secs(config.consensus.peer_timeout_secs))?;

        Ok(Self {
            pow: ProofOfWork::new(config.miner.difficulty),
            config: Arc::new(config),
            identifier: Arc::from(identifier.into()),
            state: Arc::new(RwLock::new(LedgerState::new(Blockchain::new()))),
            transport,
            tail_epoch: Arc::new(AtomicU64::new(0)),
            blocks_mined: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pow(&self) -> &ProofOfWork {
        &self.pow
    }

    pub fn blocks_mined(&self) -> u64 {
        self.blocks_mined.load(Ordering::Relaxed)
    }

    /// Consistent snapshot of the full chain.
    pub async fn chain(&self) -> ChainResponse {
        let state = self.state.read().await;
        ChainResponse::new(state.blockchain.blocks().to_vec())
    }

    pub async fn chain_length(&self) -> usize {
        self.state.read().await.blockchain.len()
    }

    pub async fn pending_transactions(&self) -> Vec<Transaction> {
        self.state
            .read()
            .await
            .blockchain
            .pending_transactions()
            .to_vec()
    }

    /// Queue a transaction; returns the index of the block expected to include it.
    pub async fn submit_transaction(
        &self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: f64,
    ) -> u64 {
        let mut state = self.state.write().await;
        state.blockchain.submit_transaction(sender, recipient, amount)
    }

    /// Forge the next block.
    ///
    /// The proof search runs on the blocking pool without the lock. If the tail
    /// moved in the meantime (another block was mined, or the chain was
    /// replaced) the proof is stale: it is dropped and the search restarts
    /// from the new tail. The reward transaction is queued only at commit
    /// time so a stale round leaves the pool untouched.
    pub async fn mine(&self) -> Result<Block> {
        let require_transactions = self.config.miner.require_transactions;

        loop {
            let (seed_hash, last_proof, epoch) = {
                let state = self.state.read().await;
                if require_transactions && state.blockchain.mempool_len() == 0 {
                    return Err(ChainError::NoPendingTransactions);
                }
                let last = state.blockchain.last_block()?;
                (last.hash(), last.proof, self.tail_epoch.load(Ordering::SeqCst))
            };

            let pow = self.pow;
            let tail_epoch = self.tail_epoch.clone();
            let proof = tokio::task::spawn_blocking(move || {
                pow.mine_until(last_proof, || tail_epoch.load(Ordering::SeqCst) != epoch)
            })
            .await
            .map_err(|e| ChainError::TaskFailed(e.to_string()))?;

            let Some(proof) = proof else {
                debug!(last_proof, "chain tail changed during proof search; restarting");
                continue;
            };

            match self.commit_mined(&seed_hash, proof).await? {
                Some(block) => return Ok(block),
                None => debug!(last_proof, proof, "mined proof is stale; restarting"),
            }
        }
    }

    /// Commit a block for `proof` if the tail is still the block hashed to
    /// `seed_hash`; `None` means the proof was mined against a stale tail.
    async fn commit_mined(&self, seed_hash: &str, proof: u64) -> Result<Option<Block>> {
        let mut state = self.state.write().await;
        if state.blockchain.last_block()?.hash() != seed_hash {
            return Ok(None);
        }
        if self.config.miner.require_transactions && state.blockchain.mempool_len() == 0 {
            return Err(ChainError::NoPendingTransactions);
        }

        state.blockchain.submit_transaction(
            REWARD_SENDER,
            self.identifier.to_string(),
            self.config.miner.reward,
        );
        let block = state.blockchain.commit_block(proof, None);
        self.tail_epoch.fetch_add(1, Ordering::SeqCst);
        self.blocks_mined.fetch_add(1, Ordering::Relaxed);

        info!(
            index = block.index,
            proof = block.proof,
            transactions = block.transactions.len(),
            "forged new block"
        );
        Ok(Some(block))
    }

    /// Register every address in `addresses`, all or nothing.
    /// Returns the full registry afterwards.
    pub async fn register_nodes<S: AsRef<str>>(&self, addresses: &[S]) -> Result<Vec<String>> {
        let normalized = addresses
            .iter()
            .map(|a| normalize_address(a.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let mut state = self.state.write().await;
        for node in &normalized {
            state.registry.register(node)?;
        }
        Ok(state.registry.list())
    }

    pub async fn peers(&self) -> Vec<String> {
        self.state.read().await.registry.list()
    }

    /// Run one round of longest-valid-chain resolution against every registered peer.
    pub async fn resolve_conflicts(&self) -> bool {
        let timeout = Duration::from_secs(self.config.consensus.peer_timeout_secs);
        let replaced = Consensus::resolve(&self.state, &self.transport, &self.pow, timeout).await;
        if replaced {
            self.tail_epoch.fetch_add(1, Ordering::SeqCst);
        }
        replaced
    }

    /// Register the configured bootstrap peers and, if enabled, reconcile with them once.
    pub async fn bootstrap(&self) {
        let peers = &self.config.network.bootstrap_peers;
        if peers.is_empty() {
            return;
        }

        {
            let mut state = self.state.write().await;
            for peer in peers {
                if let Err(e) = state.registry.register(peer) {
                    warn!(peer = %peer, error = %e, "ignoring bootstrap peer");
                }
            }
        }

        if self.config.consensus.resolve_on_start {
            let replaced = self.resolve_conflicts().await;
            info!(replaced, "initial chain resolution finished");
        }
    }

    /// Test hook: the shared state, for injecting concurrent changes.
    #[cfg(test)]
    pub(crate) fn state(&self) -> &Arc<RwLock<LedgerState>> {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::is_valid_chain;

    fn test_config(difficulty: usize) -> Config {
        let mut config = Config::default();
        config.miner.difficulty = difficulty;
        config.consensus.peer_timeout_secs = 1;
        config
    }

    #[tokio::test]
    async fn test_fresh_node_has_genesis() {
        let node = Node::new(test_config(2)).unwrap();
        let chain = node.chain().await;
        assert_eq!(chain.length, 1);
        assert_eq!(chain.chain[0].proof, 100);
        assert_eq!(chain.chain[0].previous_hash, "1");
        assert_eq!(node.identifier().len(), 32);
    }

    #[tokio::test]
    async fn test_mine_includes_transactions_and_reward() {
        let node = Node::with_identifier(test_config(2), "miner-1").unwrap();
        assert_eq!(node.submit_transaction("alice", "bob", 5.0).await, 2);

        let block = node.mine().await.unwrap();
        assert_eq!(block.index, 2);
        assert_eq!(
            block.transactions,
            vec![
                Transaction::new("alice", "bob", 5.0),
                Transaction::reward("miner-1", 1.0),
            ]
        );
        assert!(node.pending_transactions().await.is_empty());
        assert_eq!(node.chain_length().await, 2);
        assert_eq!(node.blocks_mined(), 1);

        let chain = node.chain().await;
        assert!(is_valid_chain(&chain.chain, node.pow()));
    }

    #[tokio::test]
    async fn test_reward_only_block_allowed_by_default() {
        let node = Node::with_identifier(test_config(2), "miner-1").unwrap();
        let block = node.mine().await.unwrap();
        assert_eq!(block.transactions, vec![Transaction::reward("miner-1", 1.0)]);
    }

    #[tokio::test]
    async fn test_require_transactions_policy() {
        let mut config = test_config(2);
        config.miner.require_transactions = true;
        let node = Node::new(config).unwrap();

        assert!(matches!(node.mine().await, Err(ChainError::NoPendingTransactions)));
        assert_eq!(node.chain_length().await, 1);

        node.submit_transaction("alice", "bob", 1.0).await;
        assert_eq!(node.mine().await.unwrap().transactions.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_mining_stays_valid() {
        let node = Node::new(test_config(3)).unwrap();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let node = node.clone();
                tokio::spawn(async move { node.mine().await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let chain = node.chain().await;
        assert_eq!(chain.length, 5);
        assert!(is_valid_chain(&chain.chain, node.pow()));
    }

    #[tokio::test]
    async fn test_stale_proof_is_discarded() {
        let node = Node::with_identifier(test_config(2), "miner-1").unwrap();
        let pow = *node.pow();

        let (seed_hash, seed_proof) = {
            let state = node.state().read().await;
            let genesis = state.blockchain.last_block().unwrap();
            (genesis.hash(), genesis.proof)
        };
        let proof = pow.mine(seed_proof);

        let replacement = {
            let mut other = Blockchain::new();
            for _ in 0..2 {
                let last_proof = other.last_block().unwrap().proof;
                other.commit_block(pow.mine(last_proof), None);
            }
            other.blocks().to_vec()
        };
        node.state()
            .write()
            .await
            .blockchain
            .replace_chain(replacement.clone())
            .unwrap();

        assert!(node.commit_mined(&seed_hash, proof).await.unwrap().is_none());
        assert_eq!(node.chain().await.chain, replacement);
        assert_eq!(node.blocks_mined(), 0);

        let block = node.mine().await.unwrap();
        assert_eq!(block.index, 4);
        assert_eq!(block.previous_hash, replacement[2].hash());
        assert!(is_valid_chain(&node.chain().await.chain, node.pow()));
    }

    #[tokio::test]
    async fn test_register_nodes_all_or_nothing() {
        let node = Node::new(test_config(2)).unwrap();
        let nodes = node
            .register_nodes(&["http://127.0.0.1:5001", "127.0.0.1:5001", "127.0.0.1:5002"])
            .await
            .unwrap();
        assert_eq!(nodes, vec!["127.0.0.1:5001", "127.0.0.1:5002"]);

        let err = node.register_nodes(&["127.0.0.1:5003", ""]).await.unwrap_err();
        assert!(matches!(err, ChainError::InvalidPeerAddress(_)));
        assert_eq!(node.peers().await.len(), 2);
    }

    #[tokio::test]
    async fn test_resolve_without_peers() {
        let node = Node::new(test_config(2)).unwrap();
        node.mine().await.unwrap();
        let before = node.chain().await;

        assert!(!node.resolve_conflicts().await);
        assert_eq!(node.chain().await, before);
    }
}
