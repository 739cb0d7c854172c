//! NUT-06: Mint Information
//!
//! <https://github.com/cashubtc/nuts/blob/main/06.md>

use serde::{Deserialize, Serialize};

use super::nut01::PublicKey;

/// Contact info
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    /// Contact Method i.e. nostr
    pub method: String,
    /// Contact info i.e. npub...
    pub info: String,
}

/// Mint Info
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintInfo {
    /// name of the mint and should be recognizable
    pub name: Option<String>,
    /// hex pubkey of the mint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pubkey: Option<PublicKey>,
    /// implementation name and the version running
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// short description of the mint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// contact methods to reach the mint operator
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contact: Vec<ContactInfo>,
    /// message of the day that the wallet must display to the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motd: Option<String>,
}
