//! Where block transactions come from.

use powbench_core::{unix_timestamp, Address, Transaction};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Supplies one batch of transactions per block.
pub trait TransactionSource {
    fn next_batch(&mut self, count: usize) -> Vec<Transaction>;
}

/// Repeats a fixed list of transactions.
///
/// Batches cycle through the list; an empty list yields empty batches.
#[derive(Debug, Clone)]
pub struct FixedTransactions {
    transactions: Vec<Transaction>,
}

impl FixedTransactions {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }
}

impl TransactionSource for FixedTransactions {
    fn next_batch(&mut self, count: usize) -> Vec<Transaction> {
        self.transactions.iter().cycle().take(count).cloned().collect()
    }
}

/// Synthetic transfers between random addresses.
///
/// Amounts are uniform in `[0.01, 100.0)` rounded to cents, stamped with the
/// current time.
#[derive(Debug, Clone)]
pub struct RandomTransactions {
    rng: StdRng,
}

impl RandomTransactions {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible addresses and amounts.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn random_transaction(&mut self) -> Transaction {
        let sender = Address::from_bytes(self.rng.gen());
        let recipient = Address::from_bytes(self.rng.gen());
        let amount = (self.rng.gen_range(0.01..100.0_f64) * 100.0).round() / 100.0;
        Transaction::new(sender, recipient, amount, unix_timestamp())
            .expect("generated amounts are finite and positive")
    }
}

impl Default for RandomTransactions {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionSource for RandomTransactions {
    fn next_batch(&mut self, count: usize) -> Vec<Transaction> {
        (0..count).map(|_| self.random_transaction()).collect()
    }
}
