//! Nuts
//!
//! See all at <https://github.com/cashubtc/nuts>

pub mod nut00;
pub mod nut01;
pub mod nut02;
pub mod nut03;
pub mod nut04;
pub mod nut05;
pub mod nut06;
pub mod nut07;
pub mod nut12;

pub use nut00::{
    BlindSignature, BlindedMessage, CurrencyUnit, PreMint, PreMintSecrets, Proof, Proofs,
    ProofsMethods, Token, TokenEntry,
};
pub use nut01::{Keys, PublicKey, SecretKey};
pub use nut02::{Id, KeySet, KeysetResponse};
pub use nut03::{PreSplit, SplitRequest, SplitResponse};
pub use nut04::{MintQuoteRequest, MintQuoteResponse, MintRequest, MintResponse};
pub use nut05::{MeltQuoteRequest, MeltQuoteResponse, MeltRequest, MeltResponse};
pub use nut06::{ContactInfo, MintInfo};
pub use nut07::{CheckStateRequest, CheckStateResponse, ProofState, State};
pub use nut12::{BlindSignatureDleq, ProofDleq};
