//! Proof-of-work mining
//!
//! A proof is valid for a predecessor proof when
//! `sha256(format!("{last_proof}{proof}"))` starts with `difficulty` hex zeros.
//! Verification costs one hash; the search costs about `16^difficulty`.

use crate::crypto::sha256_hex;

pub const DEFAULT_DIFFICULTY: usize = 4;

/// Proof used by the genesis block.
pub const GENESIS_PROOF: u64 = 100;

/// How many candidates are tried between two cancellation checks.
const CANCEL_CHECK_INTERVAL: u64 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofOfWork {
    difficulty: usize,
}

impl Default for ProofOfWork {
    fn default() -> Self {
        Self::new(DEFAULT_DIFFICULTY)
    }
}

impl ProofOfWork {
    pub fn new(difficulty: usize) -> Self {
        Self { difficulty }
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    pub fn proof_hash(last_proof: u64, proof: u64) -> String {
        sha256_hex(format!("{}{}", last_proof, proof).as_bytes())
    }

    pub fn is_valid(&self, last_proof: u64, proof: u64) -> bool {
        let hash = Self::proof_hash(last_proof, proof);
        hash.len() >= self.difficulty && hash.bytes().take(self.difficulty).all(|b| b == b'0')
    }

    /// Smallest proof satisfying [`ProofOfWork::is_valid`] for `last_proof`.
    pub fn mine(&self, last_proof: u64) -> u64 {
        let mut proof = 0;
        while !self.is_valid(last_proof, proof) {
            proof += 1;
        }
        proof
    }

    /// Same search as [`ProofOfWork::mine`], giving up with `None` once
    /// `cancelled` reports true. The predicate is polled every
    /// `CANCEL_CHECK_INTERVAL` candidates.
    pub fn mine_until<F>(&self, last_proof: u64, cancelled: F) -> Option<u64>
    where
        F: Fn() -> bool,
    {
        let mut proof = 0;
        loop {
            if proof % CANCEL_CHECK_INTERVAL == 0 && cancelled() {
                tracing::debug!(last_proof, tried = proof, "proof search cancelled");
                return None;
            }
            if self.is_valid(last_proof, proof) {
                return Some(proof);
            }
            proof += 1;
        }
    }
}
