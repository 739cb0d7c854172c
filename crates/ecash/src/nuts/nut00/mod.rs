//! NUT-00: Notation and Models
//!
//! <https://github.com/cashubtc/nuts/blob/main/00.md>

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::amount::{self, DenominationCodec};
use crate::dhke::{self, hash_to_curve, BlindSignatureScheme};
use crate::nuts::nut01::{PublicKey, SecretKey};
use crate::nuts::nut12::{BlindSignatureDleq, ProofDleq};
use crate::nuts::Id;
use crate::secret::Secret;
use crate::Amount;

pub mod token;
pub use token::{Token, TokenEntry};

/// List of [Proof]
pub type Proofs = Vec<Proof>;

/// Utility methods for [Proofs]
pub trait ProofsMethods {
    /// Try to sum up the amounts of all [Proof]s
    fn total_amount(&self) -> Result<Amount, Error>;

    /// Try to fetch the pubkeys of all [Proof]s
    fn ys(&self) -> Result<Vec<PublicKey>, Error>;

    /// Amounts of all [Proof]s, in order
    fn amounts(&self) -> Vec<Amount>;

    /// Whether any secret appears more than once
    fn has_duplicates(&self) -> bool;
}

impl ProofsMethods for Proofs {
    fn total_amount(&self) -> Result<Amount, Error> {
        Ok(Amount::try_sum(self.iter().map(|p| p.amount))?)
    }

    fn ys(&self) -> Result<Vec<PublicKey>, Error> {
        self.iter()
            .map(|p| p.y())
            .collect::<Result<Vec<PublicKey>, _>>()
    }

    fn amounts(&self) -> Vec<Amount> {
        self.iter().map(|p| p.amount).collect()
    }

    fn has_duplicates(&self) -> bool {
        let mut seen = std::collections::HashSet::with_capacity(self.len());
        self.iter().any(|p| !seen.insert(&p.secret))
    }
}

/// NUT00 Error
#[derive(Debug, Error)]
pub enum Error {
    /// Proofs required
    #[error("Proofs required in token")]
    ProofsRequired,
    /// Unsupported token
    #[error("Unsupported token")]
    UnsupportedToken,
    /// Unsupported unit
    #[error("Unsupported unit")]
    UnsupportedUnit,
    /// Signature count does not match outputs
    #[error("Expected {expected} signatures, got {found}")]
    SignatureCountMismatch {
        /// Outputs sent
        expected: usize,
        /// Signatures returned
        found: usize,
    },
    /// Amount Error
    #[error(transparent)]
    Amount(#[from] amount::Error),
    /// DHKE Error
    #[error(transparent)]
    DHKE(#[from] dhke::Error),
    /// Url Error
    #[error(transparent)]
    Url(#[from] crate::mint_url::Error),
    /// Utf8 parse error
    #[error(transparent)]
    Utf8ParseError(#[from] std::string::FromUtf8Error),
    /// Serde Json error
    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
    /// Base64 error
    #[error(transparent)]
    Base64Error(#[from] bitcoin::base64::DecodeError),
}

/// Blinded Message (also called `output`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlindedMessage {
    /// Amount
    ///
    /// The value for the requested [BlindSignature]. Zero for blank outputs.
    pub amount: Amount,
    /// Keyset ID
    ///
    /// ID from which we expect a signature.
    #[serde(rename = "id")]
    pub keyset_id: Id,
    /// Blinded secret message (B_)
    #[serde(rename = "B_")]
    pub blinded_secret: PublicKey,
}

impl BlindedMessage {
    /// Compose new blinded message
    #[inline]
    pub fn new(amount: Amount, keyset_id: Id, blinded_secret: PublicKey) -> Self {
        Self {
            amount,
            keyset_id,
            blinded_secret,
        }
    }
}

/// Blind Signature (also called `promise`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlindSignature {
    /// Amount
    pub amount: Amount,
    /// Keyset ID
    #[serde(rename = "id")]
    pub keyset_id: Id,
    /// Blinded signature (C_)
    #[serde(rename = "C_")]
    pub c: PublicKey,
    /// DLEQ Proof
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dleq: Option<BlindSignatureDleq>,
}

/// Proof
///
/// Identity is the secret: a wallet never holds two proofs with the same secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    /// Amount
    pub amount: Amount,
    /// `Keyset id`
    #[serde(rename = "id")]
    pub keyset_id: Id,
    /// Secret message
    pub secret: Secret,
    /// Unblinded signature
    #[serde(rename = "C")]
    pub c: PublicKey,
    /// DLEQ Proof
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dleq: Option<ProofDleq>,
}

impl Proof {
    /// Create new [`Proof`]
    pub fn new(amount: Amount, keyset_id: Id, secret: Secret, c: PublicKey) -> Self {
        Proof {
            amount,
            keyset_id,
            secret,
            c,
            dleq: None,
        }
    }

    /// Get y from proof
    ///
    /// Where y is `hash_to_curve(secret)`
    pub fn y(&self) -> Result<PublicKey, Error> {
        Ok(hash_to_curve(self.secret.as_bytes())?)
    }
}

impl Hash for Proof {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.secret.hash(state);
        self.keyset_id.hash(state);
    }
}

/// Premint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreMint {
    /// Blinded message
    pub blinded_message: BlindedMessage,
    /// Secret
    pub secret: Secret,
    /// R
    pub r: SecretKey,
    /// Amount
    pub amount: Amount,
}

/// Premint Secrets
///
/// The outputs of one request, in the order they are sent to the mint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreMintSecrets {
    /// Secrets
    pub secrets: Vec<PreMint>,
    /// Keyset Id
    pub keyset_id: Id,
}

impl PreMintSecrets {
    /// Create new [`PreMintSecrets`]
    pub fn new(keyset_id: Id) -> Self {
        Self {
            secrets: Vec::new(),
            keyset_id,
        }
    }

    /// Outputs with fresh random secrets, one per denomination
    pub fn from_amounts(
        keyset_id: Id,
        amounts: &[Amount],
        scheme: &dyn BlindSignatureScheme,
    ) -> Result<Self, Error> {
        let mut output = Vec::with_capacity(amounts.len());

        for amount in amounts {
            let secret = Secret::generate();
            let (blinded, r) = scheme.blind(&secret)?;

            output.push(PreMint {
                blinded_message: BlindedMessage::new(*amount, keyset_id, blinded),
                secret,
                r,
                amount: *amount,
            });
        }

        Ok(PreMintSecrets {
            secrets: output,
            keyset_id,
        })
    }

    /// Outputs for the canonical decomposition of `amount`
    pub fn random(
        keyset_id: Id,
        amount: Amount,
        codec: &DenominationCodec,
        scheme: &dyn BlindSignatureScheme,
    ) -> Result<Self, Error> {
        let amounts = codec.decompose(amount)?;
        Self::from_amounts(keyset_id, &amounts, scheme)
    }

    /// Blank outputs for melt change
    ///
    /// `max(1, ceil(log2(fee_reserve)))` outputs of amount zero; the mint assigns the amounts.
    pub fn blank(
        keyset_id: Id,
        fee_reserve: Amount,
        scheme: &dyn BlindSignatureScheme,
    ) -> Result<Self, Error> {
        let count = blank_output_count(fee_reserve);
        let amounts = vec![Amount::ZERO; count];

        Self::from_amounts(keyset_id, &amounts, scheme)
    }

    /// Iterate over secrets
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &PreMint> {
        self.secrets.iter()
    }

    /// Length of secrets
    #[inline]
    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    /// If secrets is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }

    /// Total amount of secrets
    pub fn total_amount(&self) -> Result<Amount, Error> {
        Ok(Amount::try_sum(self.secrets.iter().map(|p| p.amount))?)
    }

    /// [`BlindedMessage`]s from [`PreMintSecrets`]
    #[inline]
    pub fn blinded_messages(&self) -> Vec<BlindedMessage> {
        self.iter().map(|pm| pm.blinded_message.clone()).collect()
    }

    /// [`Secret`]s from [`PreMintSecrets`]
    #[inline]
    pub fn secrets(&self) -> Vec<Secret> {
        self.iter().map(|pm| pm.secret.clone()).collect()
    }

    /// Blinding factor from [`PreMintSecrets`]
    #[inline]
    pub fn rs(&self) -> Vec<SecretKey> {
        self.iter().map(|pm| pm.r.clone()).collect()
    }

    /// Amounts from [`PreMintSecrets`]
    #[inline]
    pub fn amounts(&self) -> Vec<Amount> {
        self.iter().map(|pm| pm.amount).collect()
    }

    /// Combine [`PreMintSecrets`], keeping order
    #[inline]
    pub fn combine(&mut self, mut other: Self) {
        self.secrets.append(&mut other.secrets)
    }

    /// Split off the outputs from `at` onwards
    pub fn split_off(&mut self, at: usize) -> Self {
        Self {
            secrets: self.secrets.split_off(at.min(self.secrets.len())),
            keyset_id: self.keyset_id,
        }
    }
}

/// Currency Unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum CurrencyUnit {
    /// Sat
    #[default]
    Sat,
    /// Msat
    Msat,
    /// Usd
    Usd,
    /// Euro
    Eur,
    /// Custom currency unit
    Custom(String),
}

impl FromStr for CurrencyUnit {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let upper_value = value.to_uppercase();
        match upper_value.as_str() {
            "SAT" => Ok(Self::Sat),
            "MSAT" => Ok(Self::Msat),
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            "" => Err(Error::UnsupportedUnit),
            _ => Ok(Self::Custom(value.to_string())),
        }
    }
}

impl fmt::Display for CurrencyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CurrencyUnit::Sat => "sat",
            CurrencyUnit::Msat => "msat",
            CurrencyUnit::Usd => "usd",
            CurrencyUnit::Eur => "eur",
            CurrencyUnit::Custom(unit) => unit,
        };
        write!(f, "{s}")
    }
}

impl Serialize for CurrencyUnit {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CurrencyUnit {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let currency: String = String::deserialize(deserializer)?;
        Self::from_str(&currency).map_err(serde::de::Error::custom)
    }
}

fn blank_output_count(fee_reserve: Amount) -> usize {
    let fee_reserve = fee_reserve.to_u64();

    let ceil_log2 = if fee_reserve <= 1 {
        0
    } else {
        64 - (fee_reserve - 1).leading_zeros()
    };

    ceil_log2.max(1) as usize
}
