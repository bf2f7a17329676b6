//! Hashing primitives for powledger
//!
//! Every node must derive the same digest from the same block content, so the
//! hash input is produced by [`canonical_block_string`] rather than by a
//! general-purpose serializer: keys are emitted in sorted order, there is no
//! whitespace, strings are JSON-escaped UTF-8 and numbers use serde_json's
//! shortest round-trip form.

use crate::blockchain::Block;
use crate::transaction::Transaction;
use rand::RngCore;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt::Write;

/// Lowercase hex SHA-256 digest of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Canonical hash of a block's content (64 lowercase hex characters).
pub fn canonical_hash(block: &Block) -> String {
    sha256_hex(canonical_block_string(block).as_bytes())
}

/// The exact byte string hashed by [`canonical_hash`].
///
/// Shape: `{"index":I,"previous_hash":"P","proof":N,"timestamp":T,"transactions":[...]}`
/// with each transaction rendered as `{"amount":A,"recipient":"R","sender":"S"}`.
pub fn canonical_block_string(block: &Block) -> String {
    let mut out = String::with_capacity(128 + block.transactions.len() * 96);

    // Writing into a String cannot fail.
    let _ = write!(
        out,
        "{{\"index\":{},\"previous_hash\":{},\"proof\":{},\"timestamp\":{},\"transactions\":[",
        block.index,
        Value::from(block.previous_hash.as_str()),
        block.proof,
        Value::from(block.timestamp),
    );

    for (i, tx) in block.transactions.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_transaction(&mut out, tx);
    }

    out.push_str("]}");
    out
}

fn write_transaction(out: &mut String, tx: &Transaction) {
    let _ = write!(
        out,
        "{{\"amount\":{},\"recipient\":{},\"sender\":{}}}",
        Value::from(tx.amount),
        Value::from(tx.recipient.as_str()),
        Value::from(tx.sender.as_str()),
    );
}

/// Random process-wide node identity: 16 random bytes as 32 hex characters.
pub fn generate_node_identifier() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
