//! NUT-05: Melting Tokens
//!
//! <https://github.com/cashubtc/nuts/blob/main/05.md>

use serde::{Deserialize, Serialize};

use super::nut00::{BlindSignature, BlindedMessage, Proofs};
use crate::Amount;

/// Melt quote request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeltQuoteRequest {
    /// Payment request to be paid
    pub payment_request: String,
}

/// Melt quote response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeltQuoteResponse {
    /// Amount of the payment request
    pub amount: Amount,
    /// Estimated routing fee reserve
    pub fee_reserve: Amount,
}

/// Melt request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeltRequest {
    /// Proofs
    pub proofs: Proofs,
    /// Payment request to be paid
    pub payment_request: String,
    /// Blank outputs for returned change (NUT-08)
    #[serde(default)]
    pub outputs: Vec<BlindedMessage>,
}

/// Melt response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeltResponse {
    /// Whether the payment went through
    pub paid: bool,
    /// Payment preimage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preimage: Option<String>,
    /// Change, signed over a prefix of the blank outputs
    #[serde(default)]
    pub change: Vec<BlindSignature>,
}
