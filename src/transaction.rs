//! Transaction type for powledger
//!
//! Transactions are opaque payloads: nothing about the sender, recipient or
//! amount is validated by the ledger.

use serde::{Deserialize, Serialize};

/// Sender used by the mining reward transaction.
pub const REWARD_SENDER: &str = "0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: f64,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: f64) -> Self {
        Transaction {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
        }
    }

    /// Reward credited to `recipient` for mining a block.
    pub fn reward(recipient: impl Into<String>, amount: f64) -> Self {
        Transaction::new(REWARD_SENDER, recipient, amount)
    }

    pub fn is_reward(&self) -> bool {
        self.sender == REWARD_SENDER
    }
}
