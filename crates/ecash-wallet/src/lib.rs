//! Ecash Wallet
//!
//! Wallet engine for Chaumian ecash. A [`Wallet`] owns the keyset registry and the proof store
//! for one mint, and drives the mint, split and melt exchanges through a [`MintConnector`].

#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

pub mod database;
pub mod error;
pub mod types;
pub mod wallet;

pub use ecash;

pub use self::error::Error;
pub use self::wallet::{KeysetRegistry, MintConnector, Wallet, WalletBuilder, WalletSettings};
