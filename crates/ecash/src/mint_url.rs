//! Mint Url

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::{ParseError, Url};

use crate::ensure_ecash;

/// Url Error
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Url error
    #[error(transparent)]
    Url(#[from] ParseError),
    /// Invalid URL structure
    #[error("Invalid URL")]
    InvalidUrl,
}

/// Normalized url of a mint
///
/// Scheme and host are lowercased, trailing slashes dropped.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MintUrl(String);

impl Serialize for MintUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MintUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        MintUrl::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl MintUrl {
    fn format_url(url: &str) -> Result<String, Error> {
        ensure_ecash!(!url.is_empty(), Error::InvalidUrl);

        let url = url.trim_end_matches('/');
        let (protocol, rest) = url.split_once("://").ok_or(Error::InvalidUrl)?;
        let (host, path) = rest.split_once('/').unwrap_or((rest, ""));

        ensure_ecash!(!host.is_empty(), Error::InvalidUrl);

        let mut formatted_url = format!("{}://{}", protocol.to_lowercase(), host.to_lowercase());
        if !path.is_empty() {
            formatted_url.push('/');
            formatted_url.push_str(path);
        }

        // reject anything the url crate cannot parse
        Url::parse(&formatted_url)?;

        Ok(formatted_url)
    }
}

impl FromStr for MintUrl {
    type Err = Error;

    fn from_str(url: &str) -> Result<Self, Self::Err> {
        Self::format_url(url).map(Self)
    }
}

impl fmt::Display for MintUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
