//! NUT-02: Keysets and keyset ID
//!
//! <https://github.com/cashubtc/nuts/blob/main/02.md>

use core::fmt;
use core::str::FromStr;

use bitcoin::base64::engine::general_purpose::{STANDARD, URL_SAFE};
use bitcoin::base64::Engine as _;
use bitcoin::hashes::{sha256, Hash};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::nut01::Keys;

/// NUT02 Error
#[derive(Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// Base64 error
    #[error(transparent)]
    Base64(#[from] bitcoin::base64::DecodeError),
    /// Invalid id length
    #[error("NUT02: Id invalid length")]
    Length,
}

/// A keyset ID is an identifier for a specific keyset. It can be derived by
/// anyone who knows the set of public keys of a mint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id([u8; Id::BYTES]);

impl Id {
    const BYTES: usize = 9;
    const STRLEN: usize = 12;

    /// [`Id`] from base64 string, standard or url safe alphabet
    pub fn try_from_base64(b64: &str) -> Result<Self, Error> {
        if b64.len() != Self::STRLEN {
            return Err(Error::Length);
        }

        let bytes = match URL_SAFE.decode(b64) {
            Ok(bytes) => bytes,
            Err(_) => STANDARD.decode(b64)?,
        };

        let bytes = <[u8; Self::BYTES]>::try_from(bytes.as_slice()).map_err(|_| Error::Length)?;

        Ok(Self(bytes))
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut output = String::with_capacity(Self::STRLEN);
        STANDARD.encode_string(self.0.as_slice(), &mut output);
        f.write_str(&output)
    }
}

impl FromStr for Id {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from_base64(s)
    }
}

impl TryFrom<String> for Id {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Id::try_from_base64(&value)
    }
}

impl Serialize for Id {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct IdVisitor;

        impl serde::de::Visitor<'_> for IdVisitor {
            type Value = Id;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a 12-character Base64 string")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Id::try_from_base64(v).map_err(|e| match e {
                    Error::Length => E::custom(format!(
                        "Invalid Length: Expected {}, got {}",
                        Id::STRLEN,
                        v.len()
                    )),
                    Error::Base64(e) => E::custom(e),
                })
            }
        }

        deserializer.deserialize_str(IdVisitor)
    }
}

impl From<&Keys> for Id {
    fn from(map: &Keys) -> Self {
        /* NUT-02 legacy keyset id
            1 - sort keyset by amount
            2 - concatenate all (sorted) public keys to one string
            3 - HASH_SHA256 the concatenated public keys
            4 - take the first 12 characters of the base64-encoded hash
        */

        // `Keys` iterates in amount order
        let pubkeys_concat: String = map.iter().map(|(_, pubkey)| pubkey.to_hex()).collect();

        let hash = sha256::Hash::hash(pubkeys_concat.as_bytes());
        let bytes = hash.to_byte_array();

        let mut id = [0u8; Self::BYTES];
        id.copy_from_slice(&bytes[..Self::BYTES]);
        Self(id)
    }
}

/// Keyset ids a mint has published, the current one last
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeysetResponse {
    /// Keyset ids, oldest first
    pub keysets: Vec<Id>,
}

/// Keyset
///
/// Immutable once published; `id` is derived from `keys`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySet {
    /// Keyset [`Id`]
    pub id: Id,
    /// Keyset [`Keys`]
    pub keys: Keys,
}

impl KeySet {
    /// Whether `id` matches the one derived from `keys`
    pub fn verify_id(&self) -> bool {
        Id::from(&self.keys) == self.id
    }
}

impl From<Keys> for KeySet {
    fn from(keys: Keys) -> Self {
        Self {
            id: Id::from(&keys),
            keys,
        }
    }
}

#[cfg(feature = "mint")]
pub mod mint {
    //! Mint side keysets

    use std::collections::BTreeMap;

    use bitcoin::hashes::sha256::Hash as Sha256;
    use bitcoin::hashes::{Hash, HashEngine};

    use super::Id;
    use crate::nuts::nut01::{Keys, PublicKey, SecretKey};
    use crate::Amount;

    /// Mint key pair for one denomination
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct KeyPair {
        /// Public key
        pub public_key: PublicKey,
        /// Secret key
        pub secret_key: SecretKey,
    }

    impl KeyPair {
        /// [`KeyPair`] from secret key
        pub fn from_secret_key(secret_key: SecretKey) -> Self {
            Self {
                public_key: secret_key.public_key(),
                secret_key,
            }
        }
    }

    /// Mint keyset with secret keys
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct KeySet {
        /// Keyset [`Id`]
        pub id: Id,
        /// Key pairs by denomination
        pub keys: BTreeMap<Amount, KeyPair>,
    }

    impl KeySet {
        /// Derive a keyset from a seed and derivation path
        pub fn generate(
            secret: impl Into<String>,
            derivation_path: impl Into<String>,
            max_order: u8,
        ) -> Result<Self, crate::nuts::nut01::Error> {
            /*
                for i in range(MAX_ORDER):
                    k_i = HASH_SHA256(s + D + i)[:32]
            */

            let mut map = BTreeMap::new();

            // SHA-256 midstate, for quicker hashing
            let mut engine = Sha256::engine();
            engine.input(secret.into().as_bytes());
            engine.input(derivation_path.into().as_bytes());

            for i in 0..max_order.min(64) {
                let amount = Amount::from(2_u64.pow(u32::from(i)));

                // Reuse midstate
                let mut e = engine.clone();
                e.input(i.to_string().as_bytes());
                let hash = Sha256::from_engine(e);
                let secret_key = SecretKey::from_slice(&hash.to_byte_array())?;
                map.insert(amount, KeyPair::from_secret_key(secret_key));
            }

            let keys = Keys::new(
                map.iter()
                    .map(|(amount, pair)| (*amount, pair.public_key))
                    .collect(),
            );

            Ok(Self {
                id: Id::from(&keys),
                keys: map,
            })
        }

        /// Public half of the keyset
        pub fn public(&self) -> super::KeySet {
            let keys = Keys::new(
                self.keys
                    .iter()
                    .map(|(amount, pair)| (*amount, pair.public_key))
                    .collect(),
            );

            super::KeySet { id: self.id, keys }
        }
    }
}
