//! Hex helpers

use bitcoin::hex::{DisplayHex, FromHex, HexToBytesError};

/// Encode bytes as lowercase hex
pub fn encode<T>(data: T) -> String
where
    T: AsRef<[u8]>,
{
    data.as_ref().to_lower_hex_string()
}

/// Decode a hex string
pub fn decode<T>(hex: T) -> Result<Vec<u8>, HexToBytesError>
where
    T: AsRef<str>,
{
    Vec::<u8>::from_hex(hex.as_ref())
}
