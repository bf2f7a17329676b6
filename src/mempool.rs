//! Pending transaction pool
//!
//! Transactions wait here, in submission order, until the next block commit
//! drains them.

use crate::transaction::Transaction;

#[derive(Debug, Clone, Default)]
pub struct Mempool {
    transactions: Vec<Transaction>,
}

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_transaction(&mut self, tx: Transaction) {
        self.transactions.push(tx);
    }

    /// Remove and return every pending transaction, oldest first.
    pub fn drain(&mut self) -> Vec<Transaction> {
        std::mem::take(&mut self.transactions)
    }

    pub fn get_all_transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_preserves_order_and_empties() {
        let mut pool = Mempool::new();
        pool.add_transaction(Transaction::new("a", "b", 1.0));
        pool.add_transaction(Transaction::new("c", "d", 2.0));
        assert_eq!(pool.len(), 2);

        let drained = pool.drain();
        assert_eq!(drained[0].sender, "a");
        assert_eq!(drained[1].sender, "c");
        assert!(pool.is_empty());
        assert!(pool.get_all_transactions().is_empty());
    }
}
