//! In-process mint
//!
//! Signs outputs with keysets derived from a fixed seed and settles every quote it issues at
//! once. Melting pays only payment requests this mint handed out itself, charging no fee and
//! returning the whole overpayment as change.

use std::collections::{HashMap, HashSet};
use std::fmt::Display;

use anyhow::Result;
use ecash::bitcoin::hashes::{sha256, Hash};
use ecash::dhke::{sign_message, verify_message};
use ecash::nuts::nut02::mint::{KeyPair, KeySet as MintKeySet};
use ecash::nuts::{
    BlindSignature, BlindedMessage, CheckStateRequest, CheckStateResponse, Id, KeySet,
    KeysetResponse, MeltQuoteRequest, MeltQuoteResponse, MeltRequest, MeltResponse, MintInfo,
    MintQuoteRequest, MintQuoteResponse, MintRequest, MintResponse, ProofState, Proofs,
    ProofsMethods, PublicKey, SecretKey, SplitRequest, SplitResponse, State,
};
use ecash::util::hex;
use ecash::lightning_invoice::{Currency, InvoiceBuilder, PaymentSecret};
use ecash::{Amount, Bolt11Invoice, DenominationCodec, ErrorCode, ErrorResponse, SECP256K1};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Url the fake mint is reachable under
pub const FAKE_MINT_URL: &str = "https://fake.mint.example";

/// Name the fake mint reports in its info
pub const FAKE_MINT_NAME: &str = "Fake Mint";

const SEED: &str = "fake mint seed";
const LEGACY_DERIVATION_PATH: &str = "0/0/0/0";
const CURRENT_DERIVATION_PATH: &str = "0/0/0/1";
const MAX_ORDER: u8 = 64;

#[derive(Debug, Clone)]
struct Quote {
    amount: Amount,
    preimage: [u8; 32],
    issued: bool,
}

#[derive(Debug, Default)]
struct MintState {
    spent: HashSet<PublicKey>,
    quotes: HashMap<String, Quote>,
    /// payment request -> quote id
    payment_requests: HashMap<String, String>,
}

/// Mint that lives in the test process
#[derive(Debug)]
pub struct FakeMint {
    info: MintInfo,
    /// Oldest first, the current keyset last
    keysets: Vec<MintKeySet>,
    state: Mutex<MintState>,
}

impl FakeMint {
    /// Create a mint with a legacy and a current keyset
    pub fn new() -> Result<Self> {
        let keysets = vec![
            MintKeySet::generate(SEED, LEGACY_DERIVATION_PATH, MAX_ORDER)?,
            MintKeySet::generate(SEED, CURRENT_DERIVATION_PATH, MAX_ORDER)?,
        ];

        Ok(Self {
            info: MintInfo {
                name: Some(FAKE_MINT_NAME.to_string()),
                version: Some("fake/0.1.0".to_string()),
                description: Some("In-process mint for wallet tests".to_string()),
                ..Default::default()
            },
            keysets,
            state: Mutex::new(MintState::default()),
        })
    }

    /// Mint info
    pub fn mint_info(&self) -> MintInfo {
        self.info.clone()
    }

    /// Public keys of the current keyset
    pub fn pubkeys(&self) -> Result<KeySet, ErrorResponse> {
        self.keysets
            .last()
            .map(MintKeySet::public)
            .ok_or_else(keyset_not_found)
    }

    /// Public keys of the keyset with `keyset_id`
    pub fn keyset(&self, keyset_id: &Id) -> Result<KeySet, ErrorResponse> {
        self.keysets
            .iter()
            .find(|keyset| keyset.id == *keyset_id)
            .map(MintKeySet::public)
            .ok_or_else(keyset_not_found)
    }

    /// Ids of all keysets, the current one last
    pub fn keysets(&self) -> KeysetResponse {
        KeysetResponse {
            keysets: self.keysets.iter().map(|keyset| keyset.id).collect(),
        }
    }

    /// Issue a payment request for `amount`, paid as soon as it exists
    pub async fn get_mint_quote(
        &self,
        request: MintQuoteRequest,
    ) -> Result<MintQuoteResponse, ErrorResponse> {
        if request.amount == Amount::ZERO {
            return Err(ErrorResponse::new(
                ErrorCode::TransactionUnbalanced,
                "Amount must be positive",
            ));
        }

        let id = Uuid::new_v4().to_string();
        let preimage = SecretKey::generate().to_secret_bytes();
        let payment_hash = sha256::Hash::hash(&preimage);
        let payment_request = create_fake_invoice(request.amount, payment_hash)?.to_string();

        let mut state = self.state.lock().await;
        state.quotes.insert(
            id.clone(),
            Quote {
                amount: request.amount,
                preimage,
                issued: false,
            },
        );
        state
            .payment_requests
            .insert(payment_request.clone(), id.clone());

        tracing::debug!("Issued mint quote {} for {}", id, request.amount);

        Ok(MintQuoteResponse {
            id,
            payment_request,
            payment_hash: payment_hash.to_string(),
        })
    }

    /// Sign the outputs of a paid quote
    pub async fn process_mint_request(
        &self,
        request: MintRequest,
    ) -> Result<MintResponse, ErrorResponse> {
        let mut state = self.state.lock().await;

        let quote = state.quotes.get_mut(&request.id).ok_or_else(|| {
            ErrorResponse::new(ErrorCode::QuoteNotFound, "Unknown quote")
        })?;

        if quote.issued {
            return Err(ErrorResponse::new(
                ErrorCode::TokensAlreadyIssued,
                "Tokens have already been issued for quote",
            ));
        }

        let outputs_total = request.total_amount().map_err(unbalanced)?;
        if outputs_total != quote.amount {
            return Err(unbalanced(format!(
                "Outputs of {} do not match quote of {}",
                outputs_total, quote.amount
            )));
        }

        let signatures = request
            .outputs
            .iter()
            .map(|output| self.sign(output.amount, output))
            .collect::<Result<Vec<_>, _>>()?;

        quote.issued = true;

        Ok(MintResponse { signatures })
    }

    /// Invalidate the inputs and sign outputs of the same value
    pub async fn process_split_request(
        &self,
        request: SplitRequest,
    ) -> Result<SplitResponse, ErrorResponse> {
        let mut state = self.state.lock().await;

        let ys = self.verify_inputs(&state, &request.proofs)?;

        let input_amount = request.input_amount().map_err(unbalanced)?;
        let output_amount = request.output_amount().map_err(unbalanced)?;
        if input_amount != output_amount {
            return Err(unbalanced(format!(
                "Inputs of {input_amount} do not match outputs of {output_amount}"
            )));
        }

        let signatures = request
            .outputs
            .iter()
            .map(|output| self.sign(output.amount, output))
            .collect::<Result<Vec<_>, _>>()?;

        state.spent.extend(ys);

        Ok(SplitResponse::new(signatures))
    }

    /// Quote a payment request issued by this mint
    pub async fn get_melt_quote(
        &self,
        request: MeltQuoteRequest,
    ) -> Result<MeltQuoteResponse, ErrorResponse> {
        let state = self.state.lock().await;
        let quote = lookup_payment_request(&state, &request.payment_request)?;

        Ok(MeltQuoteResponse {
            amount: quote.amount,
            fee_reserve: fee_reserve(quote.amount),
        })
    }

    /// Pay a payment request issued by this mint
    pub async fn melt(&self, request: MeltRequest) -> Result<MeltResponse, ErrorResponse> {
        let mut state = self.state.lock().await;

        let quote = lookup_payment_request(&state, &request.payment_request)?.clone();
        let ys = self.verify_inputs(&state, &request.proofs)?;

        let input_amount = request.proofs.total_amount().map_err(unbalanced)?;
        let overpaid = input_amount.checked_sub(quote.amount).ok_or_else(|| {
            unbalanced(format!(
                "Inputs of {} do not cover {}",
                input_amount, quote.amount
            ))
        })?;

        // Change beyond the blank outputs given is kept by the mint
        let change = DenominationCodec::new(MAX_ORDER)
            .decompose(overpaid)
            .map_err(unbalanced)?
            .into_iter()
            .zip(request.outputs.iter())
            .map(|(amount, output)| self.sign(amount, output))
            .collect::<Result<Vec<_>, _>>()?;

        state.spent.extend(ys);

        tracing::debug!(
            "Paid {} with {} change signatures",
            quote.amount,
            change.len()
        );

        Ok(MeltResponse {
            paid: true,
            preimage: Some(hex::encode(quote.preimage)),
            change,
        })
    }

    /// State of each proof, in request order
    pub async fn check_state(
        &self,
        request: &CheckStateRequest,
    ) -> Result<CheckStateResponse, ErrorResponse> {
        let state = self.state.lock().await;

        let states = request
            .ys
            .iter()
            .map(|y| ProofState {
                y: *y,
                state: if state.spent.contains(y) {
                    State::Spent
                } else {
                    State::Unspent
                },
            })
            .collect();

        Ok(CheckStateResponse { states })
    }

    fn key_pair(&self, keyset_id: Id, amount: Amount) -> Result<&KeyPair, ErrorResponse> {
        self.keysets
            .iter()
            .find(|keyset| keyset.id == keyset_id)
            .ok_or_else(keyset_not_found)?
            .keys
            .get(&amount)
            .ok_or_else(|| {
                ErrorResponse::new(
                    ErrorCode::TransactionUnbalanced,
                    format!("No key for amount {amount}"),
                )
            })
    }

    fn sign(&self, amount: Amount, output: &BlindedMessage) -> Result<BlindSignature, ErrorResponse> {
        let key_pair = self.key_pair(output.keyset_id, amount)?;

        let c = sign_message(&key_pair.secret_key, &output.blinded_secret).map_err(not_verified)?;

        let mut signature = BlindSignature {
            amount,
            keyset_id: output.keyset_id,
            c,
            dleq: None,
        };
        signature
            .add_dleq_proof(&output.blinded_secret, &key_pair.secret_key)
            .map_err(not_verified)?;

        Ok(signature)
    }

    /// Ys of `proofs` once each one is unique, unspent and correctly signed
    fn verify_inputs(
        &self,
        state: &MintState,
        proofs: &Proofs,
    ) -> Result<Vec<PublicKey>, ErrorResponse> {
        let ys = proofs.ys().map_err(not_verified)?;

        let unique: HashSet<&PublicKey> = ys.iter().collect();
        if unique.len() != ys.len() {
            return Err(ErrorResponse::new(
                ErrorCode::TokenPending,
                "proofs already pending.",
            ));
        }

        if ys.iter().any(|y| state.spent.contains(y)) {
            return Err(ErrorResponse::new(
                ErrorCode::TokenAlreadySpent,
                "Token already spent.",
            ));
        }

        for proof in proofs {
            let key_pair = self.key_pair(proof.keyset_id, proof.amount)?;
            verify_message(&key_pair.secret_key, proof.c, proof.secret.as_bytes())
                .map_err(not_verified)?;
        }

        Ok(ys)
    }
}

fn lookup_payment_request<'a>(
    state: &'a MintState,
    payment_request: &str,
) -> Result<&'a Quote, ErrorResponse> {
    state
        .payment_requests
        .get(payment_request)
        .and_then(|id| state.quotes.get(id))
        .ok_or_else(|| ErrorResponse::new(ErrorCode::QuoteNotFound, "Unknown payment request"))
}

/// One percent of `amount`, at least 2
/// Bolt11 invoice for `amount` sat, signed by a node key derived from the mint seed
fn create_fake_invoice(
    amount: Amount,
    payment_hash: sha256::Hash,
) -> Result<Bolt11Invoice, ErrorResponse> {
    let node_key = SecretKey::from_slice(sha256::Hash::hash(SEED.as_bytes()).as_byte_array())
        .map_err(lightning_error)?;
    let amount_msat = u64::from(amount)
        .checked_mul(1000)
        .ok_or_else(|| lightning_error("amount out of range"))?;

    InvoiceBuilder::new(Currency::Bitcoin)
        .description(FAKE_MINT_NAME.to_string())
        .payment_hash(payment_hash)
        .payment_secret(PaymentSecret([42u8; 32]))
        .amount_milli_satoshis(amount_msat)
        .current_timestamp()
        .min_final_cltv_expiry_delta(144)
        .build_signed(|hash| SECP256K1.sign_ecdsa_recoverable(hash, &node_key))
        .map_err(lightning_error)
}

fn lightning_error<E: Display>(err: E) -> ErrorResponse {
    ErrorResponse::new(ErrorCode::LightningError, err.to_string())
}

fn fee_reserve(amount: Amount) -> Amount {
    Amount::from((amount.to_u64() / 100).max(2))
}

fn keyset_not_found() -> ErrorResponse {
    ErrorResponse::new(ErrorCode::KeysetNotFound, "Keyset not found")
}

fn not_verified<E: Display>(err: E) -> ErrorResponse {
    ErrorResponse::new(ErrorCode::TokenNotVerified, err.to_string())
}

fn unbalanced<E: Display>(err: E) -> ErrorResponse {
    ErrorResponse::new(ErrorCode::TransactionUnbalanced, err.to_string())
}
