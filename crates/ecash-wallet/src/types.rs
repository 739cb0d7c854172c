//! Wallet Types

use std::fmt;

use ecash::nuts::{Proof, Proofs, PublicKey};
use ecash::Amount;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Local state of a held proof
///
/// `Spent` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProofStatus {
    /// Spendable and free for selection
    Unspent,
    /// Earmarked for an outgoing send
    Reserved,
    /// Invalidated
    Spent,
}

impl fmt::Display for ProofStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unspent => write!(f, "unspent"),
            Self::Reserved => write!(f, "reserved"),
            Self::Spent => write!(f, "spent"),
        }
    }
}

/// Proof with its local bookkeeping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofInfo {
    /// Proof
    pub proof: Proof,
    /// `hash_to_curve(secret)`, the storage key
    pub y: PublicKey,
    /// Local state
    pub state: ProofStatus,
    /// Invoice id the proof was minted for
    pub mint_id: Option<String>,
    /// Melt id the proof was consumed by
    pub melt_id: Option<String>,
}

impl ProofInfo {
    /// Create new [`ProofInfo`]
    pub fn new(proof: Proof, state: ProofStatus, mint_id: Option<String>) -> Result<Self, Error> {
        let y = proof.y()?;

        Ok(Self {
            proof,
            y,
            state,
            mint_id,
            melt_id: None,
        })
    }

    /// Wrap proofs in one state
    pub fn from_proofs(
        proofs: &Proofs,
        state: ProofStatus,
        mint_id: Option<String>,
    ) -> Result<Vec<Self>, Error> {
        proofs
            .iter()
            .map(|p| Self::new(p.clone(), state, mint_id.clone()))
            .collect()
    }
}

/// Direction of an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceDirection {
    /// Paid to the mint in exchange for minted proofs
    Incoming,
    /// Paid by the mint from melted proofs
    Outgoing,
}

/// Lightning invoice record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Correlation id: the mint quote id, or the melt id
    pub id: String,
    /// Payment hash
    pub payment_hash: String,
    /// Bolt11 payment request
    pub payment_request: String,
    /// Invoice amount
    pub amount: Amount,
    /// Direction
    pub direction: InvoiceDirection,
    /// Settled
    pub settled: bool,
    /// Preimage, once paid
    pub preimage: Option<String>,
}

/// Outcome of paying an invoice with proofs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Melted {
    /// Melt id the consumed proofs are tagged with
    pub melt_id: String,
    /// Whether the mint paid
    pub paid: bool,
    /// Preimage
    pub preimage: Option<String>,
    /// Returned fee reserve
    pub change: Proofs,
}
