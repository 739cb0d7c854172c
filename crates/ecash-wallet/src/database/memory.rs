//! Wallet in memory database

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ecash::nuts::{Id, KeySet, PublicKey};
use tokio::sync::RwLock;

use super::{Error, WalletDatabase};
use crate::types::{Invoice, ProofInfo, ProofStatus};

/// Wallet in Memory Database
#[derive(Debug, Clone, Default)]
pub struct WalletMemoryDatabase {
    keysets: Arc<RwLock<HashMap<Id, KeySet>>>,
    keyset_ids: Arc<RwLock<Vec<Id>>>,
    invoices: Arc<RwLock<HashMap<String, Invoice>>>,
    proofs: Arc<RwLock<HashMap<PublicKey, ProofInfo>>>,
    proofs_used: Arc<RwLock<HashMap<PublicKey, ProofInfo>>>,
}

impl WalletMemoryDatabase {
    /// Create new [`WalletMemoryDatabase`]
    pub fn new(keysets: Vec<KeySet>, invoices: Vec<Invoice>) -> Self {
        let keyset_ids = keysets.iter().map(|k| k.id).collect();

        Self {
            keysets: Arc::new(RwLock::new(
                keysets.into_iter().map(|k| (k.id, k)).collect(),
            )),
            keyset_ids: Arc::new(RwLock::new(keyset_ids)),
            invoices: Arc::new(RwLock::new(
                invoices.into_iter().map(|i| (i.id.clone(), i)).collect(),
            )),
            proofs: Arc::new(RwLock::new(HashMap::new())),
            proofs_used: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl WalletDatabase for WalletMemoryDatabase {
    type Err = Error;

    async fn add_keyset(&self, keyset: KeySet) -> Result<(), Self::Err> {
        if !keyset.verify_id() {
            return Err(Error::InvalidKeysetId);
        }

        let mut keysets = self.keysets.write().await;
        let mut keyset_ids = self.keyset_ids.write().await;

        if !keysets.contains_key(&keyset.id) {
            keyset_ids.push(keyset.id);
            keysets.insert(keyset.id, keyset);
        }

        Ok(())
    }

    async fn get_keyset(&self, id: &Id) -> Result<Option<KeySet>, Self::Err> {
        Ok(self.keysets.read().await.get(id).cloned())
    }

    async fn get_keyset_ids(&self) -> Result<Vec<Id>, Self::Err> {
        Ok(self.keyset_ids.read().await.clone())
    }

    async fn add_invoice(&self, invoice: Invoice) -> Result<(), Self::Err> {
        self.invoices
            .write()
            .await
            .insert(invoice.id.clone(), invoice);
        Ok(())
    }

    async fn get_invoice(&self, id: &str) -> Result<Option<Invoice>, Self::Err> {
        Ok(self.invoices.read().await.get(id).cloned())
    }

    async fn get_invoices(&self) -> Result<Vec<Invoice>, Self::Err> {
        Ok(self.invoices.read().await.values().cloned().collect())
    }

    async fn update_proofs(
        &self,
        added: Vec<ProofInfo>,
        removed_ys: Vec<PublicKey>,
        melt_id: Option<String>,
    ) -> Result<(), Self::Err> {
        let mut proofs = self.proofs.write().await;
        let mut proofs_used = self.proofs_used.write().await;

        if added.iter().any(|info| proofs_used.contains_key(&info.y)) {
            return Err(Error::AttemptUpdateSpentProof);
        }

        for info in added {
            proofs.insert(info.y, info);
        }

        for y in removed_ys {
            if let Some(mut info) = proofs.remove(&y) {
                info.state = ProofStatus::Spent;
                info.melt_id = melt_id.clone();
                proofs_used.insert(y, info);
            }
        }

        Ok(())
    }

    async fn get_proofs(
        &self,
        states: Option<Vec<ProofStatus>>,
    ) -> Result<Vec<ProofInfo>, Self::Err> {
        let proofs = self.proofs.read().await;

        Ok(proofs
            .values()
            .filter(|info| match &states {
                Some(states) => states.contains(&info.state),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn reserve_proofs(&self, ys: Vec<PublicKey>) -> Result<(), Self::Err> {
        let mut proofs = self.proofs.write().await;

        if let Some(y) = ys.iter().find(|y| {
            proofs
                .get(y)
                .map(|info| info.state != ProofStatus::Unspent)
                .unwrap_or(true)
        }) {
            return Err(Error::ProofNotUnspent(*y));
        }

        for y in ys {
            if let Some(info) = proofs.get_mut(&y) {
                info.state = ProofStatus::Reserved;
            }
        }

        Ok(())
    }

    async fn unreserve_proofs(&self, ys: Vec<PublicKey>) -> Result<(), Self::Err> {
        let mut proofs = self.proofs.write().await;

        for y in ys {
            if let Some(info) = proofs.get_mut(&y) {
                if info.state == ProofStatus::Reserved {
                    info.state = ProofStatus::Unspent;
                }
            }
        }

        Ok(())
    }

    async fn get_spent_proofs(&self) -> Result<Vec<ProofInfo>, Self::Err> {
        Ok(self.proofs_used.read().await.values().cloned().collect())
    }
}
