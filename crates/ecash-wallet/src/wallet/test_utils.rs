#![cfg(test)]
#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ecash::bitcoin::hashes::{sha256, Hash};
use ecash::lightning_invoice::{Currency, InvoiceBuilder, PaymentSecret};
use ecash::nuts::{
    BlindSignature, CheckStateRequest, CheckStateResponse, Id, KeySet, KeysetResponse, Keys,
    MeltQuoteRequest, MeltQuoteResponse, MeltRequest, MeltResponse, MintInfo, MintQuoteRequest,
    MintQuoteResponse, MintRequest, MintResponse, Proof, Proofs, ProofsMethods, PublicKey,
    SplitRequest, SplitResponse,
};
use ecash::{Amount, Bolt11Invoice, ErrorCode, ErrorResponse, Secret, SecretKey, SECP256K1};

use crate::database::{self, WalletDatabase, WalletMemoryDatabase};
use crate::types::{Invoice, ProofInfo, ProofStatus};
use crate::wallet::selection::select_to_cover;
use crate::wallet::{MintConnector, Wallet, WalletBuilder};
use crate::Error;

/// Keyset with fresh random keys for `1..=128`
pub fn test_keyset() -> KeySet {
    let keys: BTreeMap<Amount, _> = (0..8)
        .map(|order| {
            (
                Amount::from(1u64 << order),
                SecretKey::generate().public_key(),
            )
        })
        .collect();

    KeySet::from(Keys::new(keys))
}

/// Create a test proof
pub fn test_proof(keyset_id: Id, amount: u64) -> Proof {
    Proof::new(
        Amount::from(amount),
        keyset_id,
        Secret::generate(),
        SecretKey::generate().public_key(),
    )
}

/// Signatures without DLEQ, in the order of `amounts`
pub fn test_signatures(keyset_id: Id, amounts: &[u64]) -> Vec<BlindSignature> {
    amounts
        .iter()
        .map(|amount| BlindSignature {
            amount: Amount::from(*amount),
            keyset_id,
            c: SecretKey::generate().public_key(),
            dleq: None,
        })
        .collect()
}

/// Signed bolt11 invoice for `amount_sat`
pub fn test_invoice(amount_sat: u64) -> Bolt11Invoice {
    let node_key = SecretKey::generate();
    let payment_hash = sha256::Hash::hash(&SecretKey::generate().to_secret_bytes());

    InvoiceBuilder::new(Currency::Bitcoin)
        .description("test".to_string())
        .payment_hash(payment_hash)
        .payment_secret(PaymentSecret([42u8; 32]))
        .amount_milli_satoshis(amount_sat * 1000)
        .current_timestamp()
        .min_final_cltv_expiry_delta(144)
        .build_signed(|hash| SECP256K1.sign_ecdsa_recoverable(hash, &node_key))
        .unwrap()
}

/// Store proofs as unspent
pub async fn store_proofs(wallet: &Wallet, proofs: &Proofs) {
    let infos = ProofInfo::from_proofs(proofs, ProofStatus::Unspent, None).unwrap();

    wallet
        .localstore
        .update_proofs(infos, Vec::new(), None)
        .await
        .unwrap();
}

/// Create a test wallet with a mock client
pub fn create_test_wallet(mock_client: Arc<MockMintConnector>) -> Wallet {
    WalletBuilder::new()
        .localstore(Arc::new(WalletMemoryDatabase::default()))
        .shared_client(mock_client)
        .build()
        .unwrap()
}

/// Mock MintConnector
///
/// Keyset endpoints answer from `keysets`, the current keyset last. Every other endpoint
/// answers once with its configured response.
#[derive(Debug, Default)]
pub struct MockMintConnector {
    pub keysets: Mutex<Vec<KeySet>>,
    pub keys_error: Mutex<Option<Error>>,
    pub info_response: Mutex<Option<Result<MintInfo, Error>>>,
    pub mint_quote_response: Mutex<Option<Result<MintQuoteResponse, Error>>>,
    pub mint_response: Mutex<Option<Result<MintResponse, Error>>>,
    pub split_response: Mutex<Option<Result<SplitResponse, Error>>>,
    pub melt_quote_response: Mutex<Option<Result<MeltQuoteResponse, Error>>>,
    pub melt_response: Mutex<Option<Result<MeltResponse, Error>>>,
    pub check_state_response: Mutex<Option<Result<CheckStateResponse, Error>>>,
}

impl MockMintConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_keyset(&self, keyset: KeySet) {
        self.keysets.lock().unwrap().push(keyset);
    }

    pub fn clear_keysets(&self) {
        self.keysets.lock().unwrap().clear();
    }

    pub fn set_keys_error(&self, error: Error) {
        *self.keys_error.lock().unwrap() = Some(error);
    }

    pub fn set_info_response(&self, response: Result<MintInfo, Error>) {
        *self.info_response.lock().unwrap() = Some(response);
    }

    pub fn set_mint_quote_response(&self, response: Result<MintQuoteResponse, Error>) {
        *self.mint_quote_response.lock().unwrap() = Some(response);
    }

    pub fn set_mint_response(&self, response: Result<MintResponse, Error>) {
        *self.mint_response.lock().unwrap() = Some(response);
    }

    pub fn set_split_response(&self, response: Result<SplitResponse, Error>) {
        *self.split_response.lock().unwrap() = Some(response);
    }

    pub fn set_melt_quote_response(&self, response: Result<MeltQuoteResponse, Error>) {
        *self.melt_quote_response.lock().unwrap() = Some(response);
    }

    pub fn set_melt_response(&self, response: Result<MeltResponse, Error>) {
        *self.melt_response.lock().unwrap() = Some(response);
    }

    pub fn set_check_state_response(&self, response: Result<CheckStateResponse, Error>) {
        *self.check_state_response.lock().unwrap() = Some(response);
    }
}

fn scripted<T>(slot: &Mutex<Option<Result<T, Error>>>, endpoint: &str) -> Result<T, Error> {
    slot.lock()
        .unwrap()
        .take()
        .unwrap_or_else(|| {
            panic!("MockMintConnector: {endpoint} called without configured response")
        })
}

fn keyset_not_found() -> Error {
    ErrorResponse::new(ErrorCode::KeysetNotFound, "keyset not found").into()
}

#[async_trait::async_trait]
impl MintConnector for MockMintConnector {
    async fn get_mint_keys(&self) -> Result<KeySet, Error> {
        if let Some(error) = self.keys_error.lock().unwrap().take() {
            return Err(error);
        }

        self.keysets
            .lock()
            .unwrap()
            .last()
            .cloned()
            .ok_or_else(keyset_not_found)
    }

    async fn get_mint_keyset(&self, keyset_id: Id) -> Result<KeySet, Error> {
        self.keysets
            .lock()
            .unwrap()
            .iter()
            .find(|keyset| keyset.id == keyset_id)
            .cloned()
            .ok_or_else(keyset_not_found)
    }

    async fn get_mint_keysets(&self) -> Result<KeysetResponse, Error> {
        Ok(KeysetResponse {
            keysets: self.keysets.lock().unwrap().iter().map(|k| k.id).collect(),
        })
    }

    async fn get_mint_info(&self) -> Result<MintInfo, Error> {
        scripted(&self.info_response, "get_mint_info")
    }

    async fn post_mint_quote(
        &self,
        _request: MintQuoteRequest,
    ) -> Result<MintQuoteResponse, Error> {
        scripted(&self.mint_quote_response, "post_mint_quote")
    }

    async fn post_mint(&self, _request: MintRequest) -> Result<MintResponse, Error> {
        scripted(&self.mint_response, "post_mint")
    }

    async fn post_split(&self, _request: SplitRequest) -> Result<SplitResponse, Error> {
        scripted(&self.split_response, "post_split")
    }

    async fn post_melt_quote(
        &self,
        _request: MeltQuoteRequest,
    ) -> Result<MeltQuoteResponse, Error> {
        scripted(&self.melt_quote_response, "post_melt_quote")
    }

    async fn post_melt(&self, _request: MeltRequest) -> Result<MeltResponse, Error> {
        scripted(&self.melt_response, "post_melt")
    }

    async fn post_check_state(
        &self,
        _request: CheckStateRequest,
    ) -> Result<CheckStateResponse, Error> {
        scripted(&self.check_state_response, "post_check_state")
    }
}

/// Memory store with hooks for failure and interleaving
#[derive(Debug, Default)]
pub struct HookedDatabase {
    pub inner: WalletMemoryDatabase,
    /// `add_invoice` fails while set
    pub fail_invoice_writes: AtomicBool,
    /// Once set, the next `update_proofs` is followed by a competing send of this amount
    pub race_send: Mutex<Option<Amount>>,
    /// Proofs the competing send managed to reserve
    pub raced: Mutex<Proofs>,
}

impl HookedDatabase {
    /// What a second wallet sharing this store would do: select and reserve `amount`
    async fn competing_send(&self, amount: Amount) {
        let unspent: Proofs = self
            .inner
            .get_proofs(Some(vec![ProofStatus::Unspent]))
            .await
            .unwrap()
            .into_iter()
            .map(|info| info.proof)
            .collect();

        if let Ok(selected) = select_to_cover(unspent, amount) {
            if self
                .inner
                .reserve_proofs(selected.ys().unwrap())
                .await
                .is_ok()
            {
                self.raced.lock().unwrap().extend(selected);
            }
        }
    }
}

#[async_trait]
impl WalletDatabase for HookedDatabase {
    type Err = database::Error;

    async fn add_keyset(&self, keyset: KeySet) -> Result<(), Self::Err> {
        self.inner.add_keyset(keyset).await
    }

    async fn get_keyset(&self, id: &Id) -> Result<Option<KeySet>, Self::Err> {
        self.inner.get_keyset(id).await
    }

    async fn get_keyset_ids(&self) -> Result<Vec<Id>, Self::Err> {
        self.inner.get_keyset_ids().await
    }

    async fn add_invoice(&self, invoice: Invoice) -> Result<(), Self::Err> {
        if self.fail_invoice_writes.load(Ordering::SeqCst) {
            return Err(database::Error::Database("invoice table unavailable".into()));
        }
        self.inner.add_invoice(invoice).await
    }

    async fn get_invoice(&self, id: &str) -> Result<Option<Invoice>, Self::Err> {
        self.inner.get_invoice(id).await
    }

    async fn get_invoices(&self) -> Result<Vec<Invoice>, Self::Err> {
        self.inner.get_invoices().await
    }

    async fn update_proofs(
        &self,
        added: Vec<ProofInfo>,
        removed_ys: Vec<PublicKey>,
        melt_id: Option<String>,
    ) -> Result<(), Self::Err> {
        self.inner.update_proofs(added, removed_ys, melt_id).await?;

        let race = self.race_send.lock().unwrap().take();
        if let Some(amount) = race {
            self.competing_send(amount).await;
        }

        Ok(())
    }

    async fn get_proofs(
        &self,
        states: Option<Vec<ProofStatus>>,
    ) -> Result<Vec<ProofInfo>, Self::Err> {
        self.inner.get_proofs(states).await
    }

    async fn reserve_proofs(&self, ys: Vec<PublicKey>) -> Result<(), Self::Err> {
        self.inner.reserve_proofs(ys).await
    }

    async fn unreserve_proofs(&self, ys: Vec<PublicKey>) -> Result<(), Self::Err> {
        self.inner.unreserve_proofs(ys).await
    }

    async fn get_spent_proofs(&self) -> Result<Vec<ProofInfo>, Self::Err> {
        self.inner.get_spent_proofs().await
    }
}

/// Test wallet over a [`HookedDatabase`]
pub fn create_hooked_wallet(
    mock_client: Arc<MockMintConnector>,
    store: Arc<HookedDatabase>,
) -> Wallet {
    WalletBuilder::new()
        .localstore(store)
        .shared_client(mock_client)
        .build()
        .unwrap()
}
