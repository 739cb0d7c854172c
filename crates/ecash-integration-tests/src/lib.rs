//! End to end tests of the ecash wallet
//!
//! The wallet talks to a [`fake_mint::FakeMint`] living in the same process, through a
//! connector that calls the mint directly instead of going over the network.

pub mod fake_mint;

use ecash::nuts::{Proofs, ProofsMethods};
use ecash::Amount;
use ecash_wallet::Wallet;

/// Sum of the proofs, panics on overflow
pub fn total(proofs: &Proofs) -> Amount {
    proofs.total_amount().expect("proof amounts overflow")
}

/// Amounts from plain numbers
pub fn amounts(values: &[u64]) -> Vec<Amount> {
    values.iter().map(Amount::from).collect()
}

/// Sorted amounts of the wallet's unspent proofs
pub async fn unspent_amounts(wallet: &Wallet) -> Vec<Amount> {
    let mut amounts = wallet
        .get_unspent_proofs()
        .await
        .expect("proofs readable")
        .amounts();
    amounts.sort();
    amounts
}
