//! Diffie-Hellmann key exchange
//!
//! Blind signature primitives over secp256k1 and the [`BlindSignatureScheme`] capability the
//! wallet consumes them through.

use std::fmt;

use bitcoin::hashes::sha256::Hash as Sha256Hash;
use bitcoin::hashes::{Hash, HashEngine};
use bitcoin::secp256k1::{Parity, PublicKey as NormalizedPublicKey, Scalar, XOnlyPublicKey};
use thiserror::Error;

use crate::nuts::nut01::{PublicKey, SecretKey};
use crate::nuts::nut12::ProofDleq;
use crate::nuts::{BlindSignature, Keys, Proof, Proofs};
use crate::secret::Secret;
use crate::util::hex;
use crate::{Amount, SECP256K1};

const DOMAIN_SEPARATOR: &[u8; 28] = b"Secp256k1_HashToCurve_Cashu_";

/// DHKE Error
#[derive(Debug, Error)]
pub enum Error {
    /// Token could not be validated
    #[error("Token not verified")]
    TokenNotVerified,
    /// No valid point on curve
    #[error("No valid point found")]
    NoValidPoint,
    /// Keyset has no key for the amount
    #[error("No mint key for amount `{0}`")]
    UnknownDenomination(Amount),
    /// Promises, blinding factors and secrets differ in length
    #[error("Lengths of promises, rs, and secrets must be equal")]
    LengthMismatch,
    /// Secp256k1 error
    #[error(transparent)]
    Secp256k1(#[from] bitcoin::secp256k1::Error),
}

/// Blind signature capability
///
/// `unblind` is deterministic in its inputs. `verify` accepts a proof only when its signature
/// was produced by the holder of the secret key behind `mint_pubkey`; with public data alone
/// that needs the proof's DLEQ, so proofs without one are rejected.
pub trait BlindSignatureScheme: fmt::Debug + Send + Sync {
    /// Blind a secret: `B_ = Y + rG`, returns `(B_, r)`
    fn blind(&self, secret: &Secret) -> Result<(PublicKey, SecretKey), Error>;

    /// Unblind a signature: `C = C_ - rK`
    fn unblind(
        &self,
        blinded_signature: &PublicKey,
        blinding_factor: &SecretKey,
        mint_pubkey: &PublicKey,
    ) -> Result<PublicKey, Error>;

    /// Verify an unblinded proof against the mint key of its denomination
    fn verify(&self, proof: &Proof, mint_pubkey: &PublicKey) -> bool;
}

/// [`BlindSignatureScheme`] over secp256k1
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Secp256k1Dhke;

impl BlindSignatureScheme for Secp256k1Dhke {
    fn blind(&self, secret: &Secret) -> Result<(PublicKey, SecretKey), Error> {
        blind_message(secret.as_bytes(), None)
    }

    fn unblind(
        &self,
        blinded_signature: &PublicKey,
        blinding_factor: &SecretKey,
        mint_pubkey: &PublicKey,
    ) -> Result<PublicKey, Error> {
        unblind_message(blinded_signature, blinding_factor, mint_pubkey)
    }

    fn verify(&self, proof: &Proof, mint_pubkey: &PublicKey) -> bool {
        proof.verify_dleq(*mint_pubkey).is_ok()
    }
}

/// Map a message onto the curve
///
/// `Y = PublicKey('02' || sha256(sha256(DOMAIN_SEPARATOR || msg) || counter))`, with the
/// little-endian `u32` counter bumped until the x coordinate is valid.
pub fn hash_to_curve(message: &[u8]) -> Result<PublicKey, Error> {
    let msg_hash = Sha256Hash::hash(&[DOMAIN_SEPARATOR.as_slice(), message].concat());

    (0..1u32 << 16)
        .find_map(|counter| {
            let mut engine = Sha256Hash::engine();
            engine.input(msg_hash.as_byte_array());
            engine.input(&counter.to_le_bytes());
            let candidate = Sha256Hash::from_engine(engine);

            XOnlyPublicKey::from_slice(candidate.as_byte_array()).ok()
        })
        .map(|x_only| NormalizedPublicKey::from_x_only_public_key(x_only, Parity::Even).into())
        .ok_or(Error::NoValidPoint)
}

/// DLEQ challenge: sha256 over the concatenated uncompressed hex of `public_keys`
pub fn hash_e<I>(public_keys: I) -> [u8; 32]
where
    I: IntoIterator<Item = PublicKey>,
{
    let mut engine = Sha256Hash::engine();
    for public_key in public_keys {
        engine.input(hex::encode(public_key.to_uncompressed_bytes()).as_bytes());
    }

    Sha256Hash::from_engine(engine).to_byte_array()
}

/// Blind Message
///
/// `B_ = Y + rG`
pub fn blind_message(
    secret: &[u8],
    blinding_factor: Option<SecretKey>,
) -> Result<(PublicKey, SecretKey), Error> {
    let y: PublicKey = hash_to_curve(secret)?;
    let r: SecretKey = blinding_factor.unwrap_or_else(SecretKey::generate);
    Ok((y.combine(&r.public_key())?.into(), r))
}

/// Unblind Message
///
/// `C_ - rK`
pub fn unblind_message(
    // C_
    blinded_key: &PublicKey,
    r: &SecretKey,
    // K
    mint_pubkey: &PublicKey,
) -> Result<PublicKey, Error> {
    let r: Scalar = r.as_scalar();

    // a = r * K
    let a: PublicKey = mint_pubkey.mul_tweak(&SECP256K1, &r)?.into();

    // C_ - a
    let a: PublicKey = a.negate(&SECP256K1).into();
    Ok(blinded_key.combine(&a)?.into())
}

/// Construct Proofs from the mint's promises
///
/// Promises carrying a DLEQ are checked against the mint key before they become proofs
/// when `verify_dleq` is set.
pub fn construct_proofs(
    scheme: &dyn BlindSignatureScheme,
    promises: Vec<BlindSignature>,
    rs: Vec<SecretKey>,
    secrets: Vec<Secret>,
    keys: &Keys,
    verify_dleq: bool,
) -> Result<Proofs, Error> {
    if (promises.len() != rs.len()) || (promises.len() != secrets.len()) {
        tracing::error!(
            "Promises: {}, RS: {}, secrets:{}",
            promises.len(),
            rs.len(),
            secrets.len()
        );
        return Err(Error::LengthMismatch);
    }

    let mut proofs = Vec::with_capacity(promises.len());
    for ((blinded_signature, r), secret) in promises.into_iter().zip(rs).zip(secrets) {
        let a: PublicKey = keys
            .amount_key(blinded_signature.amount)
            .ok_or(Error::UnknownDenomination(blinded_signature.amount))?;

        let unblinded_signature: PublicKey = scheme.unblind(&blinded_signature.c, &r, &a)?;

        let dleq = blinded_signature.dleq.map(|d| ProofDleq::new(d.e, d.s, r));

        let proof = Proof {
            amount: blinded_signature.amount,
            keyset_id: blinded_signature.keyset_id,
            secret,
            c: unblinded_signature,
            dleq,
        };

        if verify_dleq {
            match proof.dleq {
                Some(_) if !scheme.verify(&proof, &a) => return Err(Error::TokenNotVerified),
                Some(_) => (),
                None => tracing::debug!("Mint returned no DLEQ for {}, skipping check", a),
            }
        }

        proofs.push(proof);
    }

    Ok(proofs)
}

/// Sign Blinded Message
///
/// `C_ = k * B_`, where:
/// * `k` is the private key of mint (one for each amount)
/// * `B_` is the blinded message
#[cfg(feature = "mint")]
#[inline]
pub fn sign_message(k: &SecretKey, blinded_message: &PublicKey) -> Result<PublicKey, Error> {
    Ok(blinded_message.mul_tweak(&SECP256K1, &k.as_scalar())?.into())
}

/// Verify Message
///
/// Mint side check `C == kY`
#[cfg(feature = "mint")]
pub fn verify_message(
    a: &SecretKey,
    unblinded_message: PublicKey,
    msg: &[u8],
) -> Result<(), Error> {
    // Y
    let y: PublicKey = hash_to_curve(msg)?;

    let expected_unblinded_message: PublicKey = y.mul_tweak(&SECP256K1, &a.as_scalar())?.into();

    if unblinded_message == expected_unblinded_message {
        return Ok(());
    }

    Err(Error::TokenNotVerified)
}
