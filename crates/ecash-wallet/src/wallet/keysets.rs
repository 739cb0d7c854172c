use std::sync::Arc;

use ecash::nuts::{Id, KeySet};
use tokio::sync::RwLock;
use tracing::instrument;

use crate::database::{self, WalletDatabase};
use crate::wallet::MintConnector;
use crate::{Error, Wallet};

/// Keyset Registry
///
/// Append-only cache of every keyset seen from the mint, backed by the wallet database.
/// Keysets are checked against their id before they are cached.
#[derive(Debug, Clone)]
pub struct KeysetRegistry {
    client: Arc<dyn MintConnector + Send + Sync>,
    localstore: Arc<dyn WalletDatabase<Err = database::Error> + Send + Sync>,
    current: Arc<RwLock<Option<Id>>>,
}

impl KeysetRegistry {
    /// Create new [`KeysetRegistry`]
    pub fn new(
        client: Arc<dyn MintConnector + Send + Sync>,
        localstore: Arc<dyn WalletDatabase<Err = database::Error> + Send + Sync>,
    ) -> Self {
        Self {
            client,
            localstore,
            current: Arc::new(RwLock::new(None)),
        }
    }

    /// Fetch the mint's current keyset
    #[instrument(skip(self))]
    pub async fn fetch_keys(&self) -> Result<KeySet, Error> {
        let keyset = self.client.get_mint_keys().await?;

        if !keyset.verify_id() {
            return Err(Error::MalformedResponse(format!(
                "keyset {} does not match its keys",
                keyset.id
            )));
        }

        self.localstore.add_keyset(keyset.clone()).await?;
        *self.current.write().await = Some(keyset.id);

        tracing::debug!("Current keyset is {}", keyset.id);

        Ok(keyset)
    }

    /// Keyset with `keyset_id`, from the cache or else from the mint
    #[instrument(skip(self))]
    pub async fn fetch_keys_of(&self, keyset_id: Id) -> Result<KeySet, Error> {
        if let Some(keyset) = self.localstore.get_keyset(&keyset_id).await? {
            return Ok(keyset);
        }

        let keyset = self.client.get_mint_keyset(keyset_id).await?;

        if keyset.id != keyset_id || !keyset.verify_id() {
            return Err(Error::MalformedResponse(format!(
                "asked for keyset {keyset_id}, got {}",
                keyset.id
            )));
        }

        self.localstore.add_keyset(keyset.clone()).await?;

        tracing::debug!("Cached keyset {}", keyset_id);

        Ok(keyset)
    }

    /// Ids of the mint's keysets, the current one last
    #[instrument(skip(self))]
    pub async fn fetch_keyset_ids(&self) -> Result<Vec<Id>, Error> {
        let keysets = self.client.get_mint_keysets().await?.keysets;

        // A rotated mint makes the cached current id stale
        let mut current = self.current.write().await;
        if current.is_some() && keysets.last() != current.as_ref() {
            tracing::debug!("Mint rotated its current keyset");
            *current = None;
        }

        Ok(keysets)
    }

    /// Current keyset, fetched from the mint when not known yet
    pub async fn current_keyset(&self) -> Result<KeySet, Error> {
        match self.cached_current().await? {
            Some(keyset) => Ok(keyset),
            None => self.fetch_keys().await,
        }
    }

    /// Current keyset if already known
    pub async fn cached_current(&self) -> Result<Option<KeySet>, Error> {
        let current = *self.current.read().await;

        match current {
            Some(id) => Ok(self.localstore.get_keyset(&id).await?),
            None => Ok(None),
        }
    }
}

impl Wallet {
    /// Fetch the mint's current keyset
    pub async fn fetch_keys(&self) -> Result<KeySet, Error> {
        self.keysets.fetch_keys().await
    }

    /// Fetch keyset by id, cached keysets are not requested again
    pub async fn fetch_keys_of(&self, keyset_id: Id) -> Result<KeySet, Error> {
        self.keysets.fetch_keys_of(keyset_id).await
    }

    /// Fetch the ids of the mint's keysets, the current one last
    pub async fn fetch_keyset_ids(&self) -> Result<Vec<Id>, Error> {
        self.keysets.fetch_keyset_ids().await
    }
}
