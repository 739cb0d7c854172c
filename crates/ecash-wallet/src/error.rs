//! Wallet errors

use ecash::amount;
use ecash::error::{ErrorCode, ErrorResponse};
use ecash::nuts::nut00;
use thiserror::Error;

use crate::database;

/// Wallet Error
///
/// Kinds callers match on. Mint-reported failures keep the mint's detail text untouched.
#[derive(Debug, Error)]
pub enum Error {
    /// Amount is zero
    #[error("amount must be positive.")]
    InvalidAmount,
    /// Amount exceeds the proofs or the representable range
    #[error("amount too large.")]
    AmountTooLarge,
    /// Explicit split does not add up
    #[error("split must sum to amount")]
    DenominationMismatch,
    /// Denomination outside the keyset
    #[error("Can only mint amounts with 2^n up to {max}.")]
    UnsupportedDenomination {
        /// `2^max_order`
        max: u128,
    },
    /// Proofs were already spent at the mint
    #[error("Mint Error: {0}")]
    DoubleSpend(String),
    /// Proofs are pending, at the mint or locally
    #[error("Mint Error: {0}")]
    PendingProofs(String),
    /// Not enough unspent proofs
    #[error("balance too low.")]
    InsufficientBalance,
    /// Keyset is not known to the mint
    #[error("Keyset Not Found")]
    KeysetNotFound,
    /// Quote is not known to the wallet
    #[error("Quote Unknown")]
    QuoteUnknown,
    /// Token was issued by another mint
    #[error("Token is from mint `{0}`")]
    IncorrectMint(String),
    /// Mint did not pay the invoice
    #[error("Lightning payment failed")]
    PaymentFailed,
    /// Proof carried a DLEQ that does not verify
    #[error("Could not verify Dleq")]
    CouldNotVerifyDleq,
    /// Wallet still has an operation running
    #[error("Operation in flight")]
    OperationInFlight,
    /// Partial or inconsistent mint response
    #[error("Malformed mint response: {0}")]
    MalformedResponse(String),
    /// Transport failure
    #[error("Network Error: {0}")]
    Network(String),
    /// Error reported by the mint
    #[error("Mint Error: {}", .0.detail)]
    Mint(ErrorResponse),
    /// Ecash Error
    #[error(transparent)]
    Ecash(#[from] ecash::Error),
    /// NUT00 Error
    #[error(transparent)]
    NUT00(nut00::Error),
    /// DHKE Error
    #[error(transparent)]
    DHKE(#[from] ecash::dhke::Error),
    /// Url Error
    #[error(transparent)]
    Url(#[from] ecash::mint_url::Error),
    /// Database Error
    #[error(transparent)]
    Database(#[from] database::Error),
    /// Custom Error
    #[error("`{0}`")]
    Custom(String),
    /// Parse invoice error
    #[error(transparent)]
    Invoice(#[from] ecash::lightning_invoice::ParseOrSemanticError),
}

impl From<amount::Error> for Error {
    fn from(err: amount::Error) -> Self {
        match err {
            amount::Error::AmountTooLarge | amount::Error::AmountOverflow => Self::AmountTooLarge,
            amount::Error::DenominationMismatch => Self::DenominationMismatch,
            amount::Error::UnsupportedDenomination { max } => {
                Self::UnsupportedDenomination { max }
            }
            amount::Error::InvalidAmount(_) => Self::InvalidAmount,
        }
    }
}

impl From<nut00::Error> for Error {
    fn from(err: nut00::Error) -> Self {
        match err {
            nut00::Error::Amount(err) => err.into(),
            nut00::Error::DHKE(err) => Self::DHKE(err),
            err => Self::NUT00(err),
        }
    }
}

impl From<ErrorResponse> for Error {
    fn from(err: ErrorResponse) -> Error {
        tracing::warn!("Mint returned error: {}", err);

        match err.code {
            ErrorCode::TokenAlreadySpent => Self::DoubleSpend(err.detail),
            ErrorCode::TokenPending => Self::PendingProofs(err.detail),
            ErrorCode::KeysetNotFound => Self::KeysetNotFound,
            _ => Self::Mint(err),
        }
    }
}
