//! NUT-01: Mint public key exchange
//!
//! <https://github.com/cashubtc/nuts/blob/main/01.md>

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod keys;

pub use self::keys::{PublicKey, SecretKey};
use crate::Amount;

/// Nut01 Error
#[derive(Debug, Error)]
pub enum Error {
    /// Secp256k1 Error
    #[error(transparent)]
    Secp256k1(#[from] bitcoin::secp256k1::Error),
    /// Invalid Pubkey size
    #[error("Invalid public key size: expected={expected}, found={found}")]
    InvalidPublicKeySize {
        /// Expected size
        expected: usize,
        /// Actual size
        found: usize,
    },
}

/// Mint Keys
///
/// Mapping of denomination to the mint public key that signs it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Keys(BTreeMap<Amount, PublicKey>);

impl From<BTreeMap<Amount, PublicKey>> for Keys {
    fn from(keys: BTreeMap<Amount, PublicKey>) -> Self {
        Self(keys)
    }
}

impl Keys {
    /// Create new [`Keys`]
    #[inline]
    pub fn new(keys: BTreeMap<Amount, PublicKey>) -> Self {
        Self(keys)
    }

    /// Get [`Keys`]
    #[inline]
    pub fn keys(&self) -> &BTreeMap<Amount, PublicKey> {
        &self.0
    }

    /// Get [`PublicKey`] for [`Amount`]
    #[inline]
    pub fn amount_key(&self, amount: Amount) -> Option<PublicKey> {
        self.0.get(&amount).copied()
    }

    /// Number of denominations
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no denomination is published
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate through the (`Amount`, `PublicKey`) entries, smallest amount first
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&Amount, &PublicKey)> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_from_json() {
        let keys: Keys = serde_json::from_str(
            r#"{"1":"03a40f20667ed53513075dc51e715ff2046cad64eb68960632269ba7f0210e38bc","2":"03fd4ce5a16b65576145949e6f99f445f8249fee17c606b688b504a849cdc452de"}"#,
        )
        .unwrap();

        assert_eq!(keys.len(), 2);
        assert_eq!(
            keys.amount_key(Amount::from(2)).unwrap().to_hex(),
            "03fd4ce5a16b65576145949e6f99f445f8249fee17c606b688b504a849cdc452de"
        );
        assert!(keys.amount_key(Amount::from(4)).is_none());
    }
}
