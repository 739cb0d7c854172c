//! Wallet client

use std::fmt::Debug;

use async_trait::async_trait;
use ecash::nuts::{
    CheckStateRequest, CheckStateResponse, Id, KeySet, KeysetResponse, MeltQuoteRequest,
    MeltQuoteResponse, MeltRequest, MeltResponse, MintInfo, MintQuoteRequest, MintQuoteResponse,
    MintRequest, MintResponse, SplitRequest, SplitResponse,
};

use crate::Error;

/// Interface that connects a wallet to a mint
///
/// Each call is one request/response round trip. Implementations turn the mint's error bodies
/// into [`Error`] through `From<ErrorResponse>`, keeping the mint's detail text.
#[async_trait]
pub trait MintConnector: Debug {
    /// Get the mint's current keyset
    async fn get_mint_keys(&self) -> Result<KeySet, Error>;
    /// Get Keyset Keys
    async fn get_mint_keyset(&self, keyset_id: Id) -> Result<KeySet, Error>;
    /// Get Keysets, the current one last
    async fn get_mint_keysets(&self) -> Result<KeysetResponse, Error>;
    /// Get Mint Info
    async fn get_mint_info(&self) -> Result<MintInfo, Error>;
    /// Mint Quote
    async fn post_mint_quote(
        &self,
        request: MintQuoteRequest,
    ) -> Result<MintQuoteResponse, Error>;
    /// Mint Tokens
    async fn post_mint(&self, request: MintRequest) -> Result<MintResponse, Error>;
    /// Split Token
    async fn post_split(&self, request: SplitRequest) -> Result<SplitResponse, Error>;
    /// Melt Quote
    async fn post_melt_quote(
        &self,
        request: MeltQuoteRequest,
    ) -> Result<MeltQuoteResponse, Error>;
    /// Melt, with blank outputs for the returned fee reserve
    async fn post_melt(&self, request: MeltRequest) -> Result<MeltResponse, Error>;
    /// Spendable check
    async fn post_check_state(
        &self,
        request: CheckStateRequest,
    ) -> Result<CheckStateResponse, Error>;
}
