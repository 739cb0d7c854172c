//! Errors

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Ecash Error
#[derive(Debug, Error)]
pub enum Error {
    /// Amount Error
    #[error(transparent)]
    Amount(#[from] crate::amount::Error),
    /// DHKE Error
    #[error(transparent)]
    DHKE(#[from] crate::dhke::Error),
    /// NUT00 Error
    #[error(transparent)]
    NUT00(#[from] crate::nuts::nut00::Error),
    /// NUT01 Error
    #[error(transparent)]
    NUT01(#[from] crate::nuts::nut01::Error),
    /// NUT02 Error
    #[error(transparent)]
    NUT02(#[from] crate::nuts::nut02::Error),
    /// NUT12 Error
    #[error(transparent)]
    NUT12(#[from] crate::nuts::nut12::Error),
    /// Secret Error
    #[error(transparent)]
    Secret(#[from] crate::secret::Error),
    /// Url Error
    #[error(transparent)]
    Url(#[from] crate::mint_url::Error),
    /// Serde Json error
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

/// Error response returned by a mint
///
/// `detail` is the mint's own text and is never rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error Code
    pub code: ErrorCode,
    /// Human readable description
    #[serde(default)]
    pub detail: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "code: {}, detail: {}", self.code, self.detail)
    }
}

impl ErrorResponse {
    /// Create new [`ErrorResponse`]
    pub fn new<S>(code: ErrorCode, detail: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            code,
            detail: detail.into(),
        }
    }

    /// Error response from json
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(json)?;

        Self::from_value(value)
    }

    /// Error response from json Value
    ///
    /// Bodies that do not match the error shape are kept whole as the detail.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        Ok(
            Self::deserialize(&value).unwrap_or_else(|_| Self {
                code: ErrorCode::Unknown(999),
                detail: value.to_string(),
            }),
        )
    }
}

macro_rules! error_codes {
    ($($(#[$doc:meta])* $variant:ident = $code:literal,)+) => {
        /// Error codes a mint answers with
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "u16", into = "u16")]
        pub enum ErrorCode {
            $($(#[$doc])* $variant,)+
            /// Code without a named variant
            Unknown(u16),
        }

        impl ErrorCode {
            /// Error code from its numeric value
            pub fn from_code(code: u16) -> Self {
                match code {
                    $($code => Self::$variant,)+
                    other => Self::Unknown(other),
                }
            }

            /// Numeric value of the code
            pub fn to_code(&self) -> u16 {
                match self {
                    $(Self::$variant => $code,)+
                    Self::Unknown(code) => *code,
                }
            }
        }
    };
}

error_codes! {
    /// Proof verification failed
    TokenNotVerified = 10001,
    /// Proofs already spent
    TokenAlreadySpent = 11001,
    /// Proofs are pending
    TokenPending = 11002,
    /// Outputs already signed
    BlindedMessageAlreadySigned = 11003,
    /// Inputs and outputs do not balance
    TransactionUnbalanced = 11005,
    /// Keyset is not known
    KeysetNotFound = 12001,
    /// Quote is not paid
    QuoteNotPaid = 20001,
    /// Quote has already been issued
    TokensAlreadyIssued = 20002,
    /// Lightning payment failed
    LightningError = 20004,
    /// Quote not found
    QuoteNotFound = 20007,
}

impl From<u16> for ErrorCode {
    fn from(code: u16) -> Self {
        Self::from_code(code)
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.to_code()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_code(), f)
    }
}
