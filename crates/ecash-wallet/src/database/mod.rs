//! Wallet database
//!
//! The proof store and keyset cache the wallet persists through.

use std::fmt::Debug;

use async_trait::async_trait;
use ecash::nuts::{Id, KeySet, PublicKey};

use crate::types::{Invoice, ProofInfo, ProofStatus};

pub mod memory;

pub use memory::WalletMemoryDatabase;

/// Wallet database error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database Error
    #[error(transparent)]
    Database(Box<dyn std::error::Error + Send + Sync>),
    /// Keyset id does not match its keys
    #[error("Unknown or invalid keyset")]
    InvalidKeysetId,
    /// Proofs could not be reserved because one is not unspent
    #[error("Proof `{0}` is not unspent")]
    ProofNotUnspent(PublicKey),
    /// Attempt to add or update a spent proof
    #[error("Attempt to update state of spent proof")]
    AttemptUpdateSpentProof,
}

/// Wallet Database trait
///
/// Every call is all-or-nothing: a failing call leaves the store as it was.
#[async_trait]
pub trait WalletDatabase: Debug {
    /// Wallet Database Error
    type Err: Into<Error> + From<Error>;

    /// Add keyset, ignored when already known
    async fn add_keyset(&self, keyset: KeySet) -> Result<(), Self::Err>;
    /// Get keyset
    async fn get_keyset(&self, id: &Id) -> Result<Option<KeySet>, Self::Err>;
    /// Ids of stored keysets, in the order they were first added
    async fn get_keyset_ids(&self) -> Result<Vec<Id>, Self::Err>;

    /// Add or replace invoice
    async fn add_invoice(&self, invoice: Invoice) -> Result<(), Self::Err>;
    /// Get invoice
    async fn get_invoice(&self, id: &str) -> Result<Option<Invoice>, Self::Err>;
    /// Get invoices
    async fn get_invoices(&self) -> Result<Vec<Invoice>, Self::Err>;

    /// Add `added` and move the proofs behind `removed_ys` to the spent archive, tagged with
    /// `melt_id`
    async fn update_proofs(
        &self,
        added: Vec<ProofInfo>,
        removed_ys: Vec<PublicKey>,
        melt_id: Option<String>,
    ) -> Result<(), Self::Err>;
    /// Held proofs, optionally filtered by state
    async fn get_proofs(
        &self,
        states: Option<Vec<ProofStatus>>,
    ) -> Result<Vec<ProofInfo>, Self::Err>;
    /// Reserve proofs, only if every one of them is unspent
    async fn reserve_proofs(&self, ys: Vec<PublicKey>) -> Result<(), Self::Err>;
    /// Return reserved proofs to unspent
    async fn unreserve_proofs(&self, ys: Vec<PublicKey>) -> Result<(), Self::Err>;
    /// Mark proofs spent
    async fn mark_spent(
        &self,
        ys: Vec<PublicKey>,
        melt_id: Option<String>,
    ) -> Result<(), Self::Err> {
        self.update_proofs(Vec::new(), ys, melt_id).await
    }
    /// Archived spent proofs
    async fn get_spent_proofs(&self) -> Result<Vec<ProofInfo>, Self::Err>;
}
