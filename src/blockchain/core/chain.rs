use crate::crypto::canonical_hash;
use crate::error::ChainError;
use crate::mempool::Mempool;
use crate::miner::GENESIS_PROOF;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};

/// `previous_hash` of the genesis block, which has no real predecessor.
pub const GENESIS_PREVIOUS_HASH: &str = "1";

/// A committed block. Its hash is not stored; see [`Block::hash`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

impl Block {
    pub fn hash(&self) -> String {
        canonical_hash(self)
    }
}

fn now_seconds() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// The local chain plus the pool of transactions waiting for the next block.
///
/// The chain always holds at least the genesis block.
#[derive(Debug, Clone)]
pub struct Blockchain {
    blocks: Vec<Block>,
    mempool: Mempool,
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

impl Blockchain {
    /// Create a chain holding only a freshly committed genesis block.
    pub fn new() -> Self {
        let mut blockchain = Blockchain {
            blocks: Vec::new(),
            mempool: Mempool::new(),
        };
        blockchain.genesis();
        blockchain
    }

    fn genesis(&mut self) -> Block {
        self.commit_block(GENESIS_PROOF, Some(GENESIS_PREVIOUS_HASH.to_string()))
    }

    /// Queue a transaction and return the index of the block that will hold it.
    pub fn submit_transaction(
        &mut self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: f64,
    ) -> u64 {
        self.mempool
            .add_transaction(Transaction::new(sender, recipient, amount));
        self.next_index()
    }

    /// Append a block carrying every pending transaction and clear the pool.
    ///
    /// `previous_hash` defaults to the canonical hash of the current tail.
    pub fn commit_block(&mut self, proof: u64, previous_hash: Option<String>) -> Block {
        let previous_hash = previous_hash.unwrap_or_else(|| {
            self.blocks
                .last()
                .map(canonical_hash)
                .unwrap_or_else(|| GENESIS_PREVIOUS_HASH.to_string())
        });

        let block = Block {
            index: self.next_index(),
            timestamp: now_seconds(),
            transactions: self.mempool.drain(),
            proof,
            previous_hash,
        };

        self.blocks.push(block.clone());
        block
    }

    pub fn last_block(&self) -> Result<&Block, ChainError> {
        self.blocks.last().ok_or(ChainError::EmptyChain)
    }

    /// Swap in `chain` wholesale. Pending transactions are kept.
    ///
    /// Callers are expected to have validated `chain`; only emptiness is rejected here.
    pub fn replace_chain(&mut self, chain: Vec<Block>) -> Result<(), ChainError> {
        if chain.is_empty() {
            return Err(ChainError::EmptyChain);
        }
        self.blocks = chain;
        Ok(())
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn pending_transactions(&self) -> &[Transaction] {
        self.mempool.get_all_transactions()
    }

    pub fn mempool_len(&self) -> usize {
        self.mempool.len()
    }

    fn next_index(&self) -> u64 {
        self.blocks.len() as u64 + 1
    }
}
