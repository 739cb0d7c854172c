use std::sync::Arc;

use ecash::nuts::CurrencyUnit;
use ecash::{BlindSignatureScheme, MintUrl, Secp256k1Dhke};

use crate::database::{self, WalletDatabase};
use crate::wallet::{MintConnector, Wallet, WalletSettings};
use crate::Error;

/// Builder for creating a new [`Wallet`]
#[derive(Debug, Default)]
pub struct WalletBuilder {
    settings: Option<WalletSettings>,
    mint_url: Option<MintUrl>,
    unit: Option<CurrencyUnit>,
    localstore: Option<Arc<dyn WalletDatabase<Err = database::Error> + Send + Sync>>,
    client: Option<Arc<dyn MintConnector + Send + Sync>>,
    scheme: Option<Arc<dyn BlindSignatureScheme>>,
}

impl WalletBuilder {
    /// Create a new WalletBuilder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the settings, defaults are used otherwise
    pub fn settings(mut self, settings: WalletSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Set the mint URL, overriding the settings
    pub fn mint_url(mut self, mint_url: MintUrl) -> Self {
        self.mint_url = Some(mint_url);
        self
    }

    /// Set the currency unit, overriding the settings
    pub fn unit(mut self, unit: CurrencyUnit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Set the local storage backend
    pub fn localstore(
        mut self,
        localstore: Arc<dyn WalletDatabase<Err = database::Error> + Send + Sync>,
    ) -> Self {
        self.localstore = Some(localstore);
        self
    }

    /// Set a custom client connector
    pub fn client<C: MintConnector + 'static + Send + Sync>(mut self, client: C) -> Self {
        self.client = Some(Arc::new(client));
        self
    }

    /// Set a custom client connector from Arc
    pub fn shared_client(mut self, client: Arc<dyn MintConnector + Send + Sync>) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the blind signature scheme, secp256k1 otherwise
    pub fn scheme(mut self, scheme: Arc<dyn BlindSignatureScheme>) -> Self {
        self.scheme = Some(scheme);
        self
    }

    /// Build the wallet
    pub fn build(self) -> Result<Wallet, Error> {
        let mut settings = self.settings.unwrap_or_default();
        if let Some(mint_url) = self.mint_url {
            settings.mint_url = mint_url;
        }
        if let Some(unit) = self.unit {
            settings.unit = unit;
        }

        let localstore = self
            .localstore
            .ok_or(Error::Custom("Localstore required".to_string()))?;
        let client = self
            .client
            .ok_or(Error::Custom("Mint connector required".to_string()))?;
        let scheme = self.scheme.unwrap_or_else(|| Arc::new(Secp256k1Dhke));

        Ok(Wallet::with_scheme(settings, localstore, client, scheme))
    }
}
