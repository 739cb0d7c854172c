//! Token
//!
//! Serialized proofs a holder hands to a receiver: `cashuA` followed by url safe base64 json.

use core::fmt;
use core::str::FromStr;

use bitcoin::base64::engine::{general_purpose, GeneralPurpose};
use bitcoin::base64::{alphabet, Engine as _};
use serde::{Deserialize, Serialize};

use super::{Error, Proof, Proofs, ProofsMethods};
use crate::mint_url::MintUrl;
use crate::Amount;

const TOKEN_PREFIX: &str = "cashuA";

/// Proofs issued by one mint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEntry {
    /// Url of mint
    pub mint: MintUrl,
    /// [`Proofs`]
    pub proofs: Proofs,
}

/// Token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Proofs in [`Token`] by mint
    pub token: Vec<TokenEntry>,
    /// Memo for token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

impl Token {
    /// Create new [`Token`]
    pub fn new(mint_url: MintUrl, proofs: Proofs, memo: Option<String>) -> Result<Self, Error> {
        if proofs.is_empty() {
            return Err(Error::ProofsRequired);
        }

        Ok(Self {
            token: vec![TokenEntry {
                mint: mint_url,
                proofs,
            }],
            memo,
        })
    }

    /// All proofs, in token order
    pub fn proofs(&self) -> Proofs {
        self.token
            .iter()
            .flat_map(|entry| entry.proofs.iter().cloned())
            .collect::<Vec<Proof>>()
    }

    /// Mint urls the token names
    pub fn mint_urls(&self) -> Vec<MintUrl> {
        self.token.iter().map(|entry| entry.mint.clone()).collect()
    }

    /// Total value
    pub fn value(&self) -> Result<Amount, Error> {
        self.proofs().total_amount()
    }
}

impl FromStr for Token {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().strip_prefix(TOKEN_PREFIX).ok_or(Error::UnsupportedToken)?;

        let decode_config = general_purpose::GeneralPurposeConfig::new()
            .with_decode_padding_mode(bitcoin::base64::engine::DecodePaddingMode::Indifferent);
        let decoded = GeneralPurpose::new(&alphabet::URL_SAFE, decode_config).decode(s)?;
        let decoded_str = String::from_utf8(decoded)?;
        let token: Token = serde_json::from_str(&decoded_str)?;

        if token.token.iter().all(|entry| entry.proofs.is_empty()) {
            return Err(Error::ProofsRequired);
        }

        Ok(token)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json_string = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        let encoded = general_purpose::URL_SAFE.encode(json_string);
        write!(f, "{TOKEN_PREFIX}{encoded}")
    }
}
