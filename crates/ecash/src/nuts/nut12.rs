//! NUT-12: Offline ecash signature validation
//!
//! <https://github.com/cashubtc/nuts/blob/main/12.md>

use bitcoin::secp256k1;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::nut00::{BlindSignature, Proof};
use super::nut01::{PublicKey, SecretKey};
use crate::dhke::{hash_e, hash_to_curve};
use crate::SECP256K1;

/// NUT12 Error
#[derive(Debug, Error)]
pub enum Error {
    /// Missing Dleq Proof
    #[error("No Dleq Proof provided")]
    MissingDleqProof,
    /// Invalid Dleq Proof
    #[error("Invalid Dleq Proof")]
    InvalidDleqProof,
    /// DHKE Error
    #[error(transparent)]
    DHKE(#[from] crate::dhke::Error),
    /// NUT01 Error
    #[error(transparent)]
    NUT01(#[from] crate::nuts::nut01::Error),
    /// SECP256k1 Error
    #[error(transparent)]
    Secp256k1(#[from] secp256k1::Error),
}

/// Blinded Signature on Dleq
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlindSignatureDleq {
    /// e
    pub e: SecretKey,
    /// s
    pub s: SecretKey,
}

/// Proof Dleq
///
/// Carries the blinding factor so anyone holding the proof can re-check the signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofDleq {
    /// e
    pub e: SecretKey,
    /// s
    pub s: SecretKey,
    /// Blinding factor
    pub r: SecretKey,
}

impl ProofDleq {
    /// Create new [`ProofDleq`]
    pub fn new(e: SecretKey, s: SecretKey, r: SecretKey) -> Self {
        Self { e, s, r }
    }
}

/// `k * point`
fn mul(point: &PublicKey, k: &SecretKey) -> Result<PublicKey, Error> {
    Ok(point.mul_tweak(&SECP256K1, &k.as_scalar())?.into())
}

/// `lhs - rhs`
fn sub(lhs: &PublicKey, rhs: &PublicKey) -> Result<PublicKey, Error> {
    Ok(lhs.combine(&rhs.negate(&SECP256K1))?.into())
}

/// Check `e == hash(s*G - e*A, s*B' - e*C', A, C')`
fn verify_dleq(
    blinded_message: PublicKey,
    blinded_signature: PublicKey,
    e: &SecretKey,
    s: &SecretKey,
    mint_pubkey: PublicKey,
) -> Result<(), Error> {
    let r1 = sub(&s.public_key(), &mul(&mint_pubkey, e)?)?;
    let r2 = sub(
        &mul(&blinded_message, s)?,
        &mul(&blinded_signature, e)?,
    )?;

    if hash_e([r1, r2, mint_pubkey, blinded_signature]) != e.to_secret_bytes() {
        tracing::warn!("DLEQ on signature failed");
        return Err(Error::InvalidDleqProof);
    }

    Ok(())
}

/// Prove `C' = a*B'` for the mint key `a`
///
/// With nonce `r`: `e = hash(r*G, r*B', A, C')` and `s = r + e*a`.
#[cfg(feature = "mint")]
fn calculate_dleq(
    blinded_signature: PublicKey,
    blinded_message: &PublicKey,
    mint_secret_key: &SecretKey,
) -> Result<BlindSignatureDleq, Error> {
    let nonce = SecretKey::generate();

    let e = SecretKey::from_slice(&hash_e([
        nonce.public_key(),
        mul(blinded_message, &nonce)?,
        mint_secret_key.public_key(),
        blinded_signature,
    ]))?;

    let ea: SecretKey = e.mul_tweak(&mint_secret_key.as_scalar())?.into();
    let s: SecretKey = nonce.add_tweak(&ea.as_scalar())?.into();

    Ok(BlindSignatureDleq { e, s })
}

impl Proof {
    /// Verify proof Dleq
    ///
    /// Rebuilds `B' = Y + rG` and `C' = C + rA` from the stored blinding factor.
    pub fn verify_dleq(&self, mint_pubkey: PublicKey) -> Result<(), Error> {
        let dleq = self.dleq.as_ref().ok_or(Error::MissingDleqProof)?;

        let y = hash_to_curve(self.secret.as_bytes())?;
        let blinded_message: PublicKey = y.combine(&dleq.r.public_key())?.into();
        let ra = mul(&mint_pubkey, &dleq.r)?;
        let blinded_signature: PublicKey = self.c.combine(&ra)?.into();

        verify_dleq(
            blinded_message,
            blinded_signature,
            &dleq.e,
            &dleq.s,
            mint_pubkey,
        )
    }
}

impl BlindSignature {
    /// Verify dleq on the blind signature
    #[inline]
    pub fn verify_dleq(
        &self,
        mint_pubkey: PublicKey,
        blinded_message: PublicKey,
    ) -> Result<(), Error> {
        match &self.dleq {
            Some(dleq) => verify_dleq(blinded_message, self.c, &dleq.e, &dleq.s, mint_pubkey),
            None => Err(Error::MissingDleqProof),
        }
    }

    /// Add Dleq to the blind signature
    #[cfg(feature = "mint")]
    pub fn add_dleq_proof(
        &mut self,
        blinded_message: &PublicKey,
        mint_secretkey: &SecretKey,
    ) -> Result<(), Error> {
        let dleq: BlindSignatureDleq = calculate_dleq(self.c, blinded_message, mint_secretkey)?;
        self.dleq = Some(dleq);
        Ok(())
    }
}
