//! Wallet
//!
//! One [`Wallet`] per mint and unit. It is the context object for every protocol exchange:
//! the keyset registry, the proof store and the mint connector all hang off it.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use ecash::nuts::{CurrencyUnit, MintInfo, PublicKey};
use ecash::{BlindSignatureScheme, DenominationCodec, MintUrl, Secp256k1Dhke};
use tracing::instrument;

use crate::database::{self, WalletDatabase};
use crate::Error;

pub mod builder;
pub mod client;
mod keysets;
mod melt;
mod mint;
mod proofs;
mod receive;
pub mod selection;
mod send;
pub mod settings;
mod swap;

#[cfg(test)]
pub(crate) mod test_utils;

pub use builder::WalletBuilder;
pub use client::MintConnector;
pub use keysets::KeysetRegistry;
pub use settings::WalletSettings;

/// Detail the mint uses for proofs that are already being spent
pub(crate) const PROOFS_PENDING: &str = "proofs already pending.";

/// Ecash Wallet
///
/// A [`Wallet`] is for a single mint and single unit.
#[derive(Debug, Clone)]
pub struct Wallet {
    /// Mint Url
    pub mint_url: MintUrl,
    /// Unit
    pub unit: CurrencyUnit,
    /// Storage backend
    pub localstore: Arc<dyn WalletDatabase<Err = database::Error> + Send + Sync>,
    /// Settings the wallet was built with
    pub settings: WalletSettings,
    client: Arc<dyn MintConnector + Send + Sync>,
    scheme: Arc<dyn BlindSignatureScheme>,
    keysets: KeysetRegistry,
    in_flight: Arc<Mutex<InFlight>>,
}

/// Operations currently talking to the mint, and the proofs they spend
#[derive(Debug, Default)]
struct InFlight {
    operations: usize,
    ys: HashSet<PublicKey>,
}

/// Marks an operation as running until dropped
#[derive(Debug)]
pub(crate) struct OperationGuard {
    in_flight: Arc<Mutex<InFlight>>,
    ys: Vec<PublicKey>,
}

impl Drop for OperationGuard {
    fn drop(&mut self) {
        let mut in_flight = lock(&self.in_flight);
        in_flight.operations = in_flight.operations.saturating_sub(1);
        for y in &self.ys {
            in_flight.ys.remove(y);
        }
    }
}

fn lock(in_flight: &Mutex<InFlight>) -> MutexGuard<'_, InFlight> {
    // The set stays consistent even if a holder panicked
    in_flight
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Wallet {
    /// Create new [`Wallet`] from settings, a store and a mint connector
    pub fn new(
        settings: WalletSettings,
        localstore: Arc<dyn WalletDatabase<Err = database::Error> + Send + Sync>,
        client: Arc<dyn MintConnector + Send + Sync>,
    ) -> Self {
        Self::with_scheme(settings, localstore, client, Arc::new(Secp256k1Dhke))
    }

    pub(crate) fn with_scheme(
        settings: WalletSettings,
        localstore: Arc<dyn WalletDatabase<Err = database::Error> + Send + Sync>,
        client: Arc<dyn MintConnector + Send + Sync>,
        scheme: Arc<dyn BlindSignatureScheme>,
    ) -> Self {
        Self {
            mint_url: settings.mint_url.clone(),
            unit: settings.unit.clone(),
            keysets: KeysetRegistry::new(client.clone(), localstore.clone()),
            localstore,
            settings,
            client,
            scheme,
            in_flight: Arc::new(Mutex::new(InFlight::default())),
        }
    }

    /// Load the mint's current keyset and every keyset it lists into the registry
    #[instrument(skip(self), fields(mint_url = %self.mint_url))]
    pub async fn open(&self) -> Result<(), Error> {
        let current = self.keysets.fetch_keys().await?;

        for id in self.keysets.fetch_keyset_ids().await? {
            self.keysets.fetch_keys_of(id).await?;
        }

        tracing::debug!("Wallet opened with current keyset {}", current.id);

        Ok(())
    }

    /// Close the wallet
    ///
    /// Refuses while an operation is still talking to the mint.
    pub fn close(self) -> Result<(), Error> {
        if lock(&self.in_flight).operations > 0 {
            return Err(Error::OperationInFlight);
        }

        tracing::debug!("Wallet for {} closed", self.mint_url);

        Ok(())
    }

    /// Query mint for its info
    #[instrument(skip(self))]
    pub async fn get_info(&self) -> Result<MintInfo, Error> {
        self.client.get_mint_info().await
    }

    /// Keyset registry of this wallet
    pub fn keysets(&self) -> &KeysetRegistry {
        &self.keysets
    }

    /// Denomination codec for the current keyset
    ///
    /// Until the current keyset is known, the codec is bounded by the configured maximum order.
    pub async fn codec(&self) -> Result<DenominationCodec, Error> {
        Ok(match self.keysets.cached_current().await? {
            Some(keyset) => DenominationCodec::from_keys(&keyset.keys),
            None => DenominationCodec::new(self.settings.max_order),
        })
    }

    /// Mark an operation as running, claiming `ys`
    ///
    /// Fails when another running operation already claimed one of them.
    pub(crate) fn begin_operation(&self, ys: &[PublicKey]) -> Result<OperationGuard, Error> {
        let mut in_flight = lock(&self.in_flight);

        if ys.iter().any(|y| in_flight.ys.contains(y)) {
            tracing::debug!("Proofs are already part of a running operation");
            return Err(Error::PendingProofs(PROOFS_PENDING.to_string()));
        }

        in_flight.operations += 1;
        in_flight.ys.extend(ys.iter().copied());

        Ok(OperationGuard {
            in_flight: self.in_flight.clone(),
            ys: ys.to_vec(),
        })
    }
}
