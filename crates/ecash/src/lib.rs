//! Ecash shared types and functions.
//!
//! This crate is the base the wallet engine builds on: amounts and the denomination codec,
//! the blind signature primitives, and the request/response types spoken with a mint.

#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

pub mod amount;
pub mod dhke;
pub mod error;
pub mod mint_url;
pub mod nuts;
pub mod secret;
pub mod util;

pub use bitcoin;
pub use lightning_invoice::{self, Bolt11Invoice};

pub use self::amount::{Amount, DenominationCodec};
pub use self::dhke::{BlindSignatureScheme, Secp256k1Dhke};
pub use self::error::{Error, ErrorCode, ErrorResponse};
pub use self::mint_url::MintUrl;
pub use self::nuts::*;
pub use self::secret::Secret;
pub use self::util::SECP256K1;

/// Ensure a condition holds, returning the given error otherwise
#[macro_export]
macro_rules! ensure_ecash {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
}
