use crate::blockchain::core::chain::Block;
use crate::crypto::canonical_hash;
use crate::error::ChainError;
use crate::miner::ProofOfWork;

/// Check hash linkage and proof-of-work between every pair of adjacent blocks,
/// stopping at the first break. A lone genesis block is valid; an empty chain is not.
pub fn validate_chain(chain: &[Block], pow: &ProofOfWork) -> Result<(), ChainError> {
    if chain.is_empty() {
        return Err(ChainError::EmptyChain);
    }

    for pair in chain.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);

        let expected_hash = canonical_hash(previous);
        if current.previous_hash != expected_hash {
            return Err(ChainError::InvalidChain(format!(
                "block {} links to {}, expected {}",
                current.index, current.previous_hash, expected_hash
            )));
        }

        if !pow.is_valid(previous.proof, current.proof) {
            return Err(ChainError::InvalidChain(format!(
                "block {} proof {} does not satisfy difficulty {} over proof {}",
                current.index,
                current.proof,
                pow.difficulty(),
                previous.proof
            )));
        }
    }

    Ok(())
}

pub fn is_valid_chain(chain: &[Block], pow: &ProofOfWork) -> bool {
    validate_chain(chain, pow).is_ok()
}
