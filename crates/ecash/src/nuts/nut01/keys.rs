//! secp256k1 key wrappers with the hex encodings used on the wire

use core::fmt;
use core::ops::Deref;
use core::str::FromStr;

use bitcoin::secp256k1::rand::rngs::OsRng;
use bitcoin::secp256k1::{self, Scalar};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use super::Error;
use crate::SECP256K1;

/// Length of a compressed public key in hex
const COMPRESSED_HEX_LEN: usize = 66;

/// Serialize through `$encode`, deserialize through `FromStr`
macro_rules! hex_serde {
    ($key:ty, $encode:ident) => {
        impl Serialize for $key {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.$encode())
            }
        }

        impl<'de> Deserialize<'de> for $key {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                String::deserialize(deserializer)?
                    .parse()
                    .map_err(de::Error::custom)
            }
        }

        impl FromStr for $key {
            type Err = Error;

            fn from_str(hex: &str) -> Result<Self, Self::Err> {
                Self::from_hex(hex)
            }
        }
    };
}

/// Compressed secp256k1 public key
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublicKey(secp256k1::PublicKey);

impl PublicKey {
    /// Parse a compressed key from hex
    pub fn from_hex<S: AsRef<str>>(hex: S) -> Result<Self, Error> {
        let hex = hex.as_ref();

        if hex.len() != COMPRESSED_HEX_LEN {
            return Err(Error::InvalidPublicKeySize {
                expected: COMPRESSED_HEX_LEN / 2,
                found: hex.len() / 2,
            });
        }

        Ok(Self(secp256k1::PublicKey::from_str(hex)?))
    }

    /// Compressed hex encoding
    pub fn to_hex(&self) -> String {
        self.0.to_string()
    }

    /// Uncompressed SEC1 encoding
    pub fn to_uncompressed_bytes(&self) -> [u8; 65] {
        self.0.serialize_uncompressed()
    }
}

impl Deref for PublicKey {
    type Target = secp256k1::PublicKey;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<secp256k1::PublicKey> for PublicKey {
    fn from(key: secp256k1::PublicKey) -> Self {
        Self(key)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublicKey").field(&self.to_hex()).finish()
    }
}

hex_serde!(PublicKey, to_hex);

/// secp256k1 secret key, never printed
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(secp256k1::SecretKey);

impl SecretKey {
    /// Fresh key from the OS rng
    pub fn generate() -> Self {
        Self(SECP256K1.generate_keypair(&mut OsRng).0)
    }

    /// Parse 32 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, Error> {
        Ok(Self(secp256k1::SecretKey::from_slice(bytes)?))
    }

    /// Parse from hex
    pub fn from_hex<S: AsRef<str>>(hex: S) -> Result<Self, Error> {
        Ok(Self(secp256k1::SecretKey::from_str(hex.as_ref())?))
    }

    /// Hex encoding of the secret
    pub fn to_secret_hex(&self) -> String {
        self.0.display_secret().to_string()
    }

    /// Raw secret bytes
    pub fn to_secret_bytes(&self) -> [u8; 32] {
        self.0.secret_bytes()
    }

    /// Matching public key
    pub fn public_key(&self) -> PublicKey {
        self.0.public_key(&SECP256K1).into()
    }

    /// The key as a tweak scalar
    pub fn as_scalar(&self) -> Scalar {
        Scalar::from(self.0)
    }
}

impl Deref for SecretKey {
    type Target = secp256k1::SecretKey;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<secp256k1::SecretKey> for SecretKey {
    fn from(key: secp256k1::SecretKey) -> Self {
        Self(key)
    }
}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey([REDACTED])")
    }
}

hex_serde!(SecretKey, to_secret_hex);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_key_hex() {
        let hex = "02194603ffa36356f4a56b7df9371fc3192472351453ec7398b8da8117e7c3e104";
        let key = PublicKey::from_hex(hex).unwrap();

        assert_eq!(key.to_hex(), hex);
        assert_eq!(
            serde_json::to_string(&key).unwrap(),
            format!("\"{hex}\"")
        );

        // uncompressed keys are refused
        assert!(matches!(
            PublicKey::from_hex("04fd4ce5a16b65576145949e6f99f445f8249fee17c606b688b504a849cdc452de3625246cb2c27dac965cb7200a5986467eee92eb7d496bbf1453b074e223e481"),
            Err(Error::InvalidPublicKeySize { expected: 33, found: 65 })
        ));
    }

    #[test]
    fn test_secret_key_hex() {
        let secret_key = SecretKey::generate();
        let parsed: SecretKey = secret_key.to_secret_hex().parse().unwrap();

        assert_eq!(secret_key, parsed);
        assert_eq!(secret_key.public_key(), parsed.public_key());
    }

    #[test]
    fn test_secret_key_is_redacted() {
        let secret_key = SecretKey::generate();

        assert!(!format!("{secret_key:?}").contains(&secret_key.to_secret_hex()));
        assert_eq!(secret_key.to_string(), "[REDACTED]");
    }
}
