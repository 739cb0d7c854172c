//! NUT-04: Mint tokens
//!
//! <https://github.com/cashubtc/nuts/blob/main/04.md>

use serde::{Deserialize, Serialize};

use super::nut00::{BlindSignature, BlindedMessage};
use crate::Amount;

/// Mint quote request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintQuoteRequest {
    /// Amount
    pub amount: Amount,
}

/// Mint quote response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintQuoteResponse {
    /// Quote Id
    pub id: String,
    /// Payment request to fulfil
    pub payment_request: String,
    /// Payment hash of the request
    pub payment_hash: String,
}

/// Mint request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintRequest {
    /// Quote id
    pub id: String,
    /// Outputs
    pub outputs: Vec<BlindedMessage>,
}

impl MintRequest {
    /// Total [`Amount`] of outputs
    pub fn total_amount(&self) -> Result<Amount, crate::amount::Error> {
        Amount::try_sum(self.outputs.iter().map(|b| b.amount))
    }
}

/// Mint response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintResponse {
    /// Blinded Signatures
    pub signatures: Vec<BlindSignature>,
}
