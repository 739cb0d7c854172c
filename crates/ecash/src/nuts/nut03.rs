//! NUT-03: Split tokens
//!
//! <https://github.com/cashubtc/nuts/blob/main/03.md>

use serde::{Deserialize, Serialize};

use super::nut00::{BlindSignature, BlindedMessage, PreMintSecrets, Proofs, ProofsMethods};
use crate::Amount;

/// Preparation of a split: the request and the secrets needed to unblind its answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreSplit {
    /// Outputs the wallet keeps
    pub keep: PreMintSecrets,
    /// Outputs for the requested amount
    pub send: PreMintSecrets,
    /// Split request
    pub split_request: SplitRequest,
}

/// Split Request
///
/// Inputs are invalidated and the outputs signed in one step. Output order is `keep` then `send`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitRequest {
    /// Proofs that are to be spent in a `Split`
    pub proofs: Proofs,
    /// Blinded Messages for Mint to sign
    pub outputs: Vec<BlindedMessage>,
}

impl SplitRequest {
    /// Create new [`SplitRequest`]
    pub fn new(proofs: Proofs, outputs: Vec<BlindedMessage>) -> Self {
        Self { proofs, outputs }
    }

    /// Total value of proofs in [`SplitRequest`]
    pub fn input_amount(&self) -> Result<Amount, crate::nuts::nut00::Error> {
        self.proofs.total_amount()
    }

    /// Total value of outputs in [`SplitRequest`]
    pub fn output_amount(&self) -> Result<Amount, crate::amount::Error> {
        Amount::try_sum(self.outputs.iter().map(|output| output.amount))
    }
}

/// Split Response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitResponse {
    /// Promises, in output order
    pub signatures: Vec<BlindSignature>,
}

impl SplitResponse {
    /// Create new [`SplitResponse`]
    pub fn new(signatures: Vec<BlindSignature>) -> Self {
        Self { signatures }
    }

    /// Total [`Amount`] of promises
    pub fn promises_amount(&self) -> Result<Amount, crate::amount::Error> {
        Amount::try_sum(self.signatures.iter().map(|s| s.amount))
    }
}
