//! Amount and denomination codec
//!
//! Amounts are denominated in the wallet unit. A mint publishes one key per power-of-two
//! denomination, up to its maximum order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::nuts::Keys;

/// Amount Error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Amount overflow
    #[error("Amount Overflow")]
    AmountOverflow,
    /// Amount is above what the denominations can represent
    #[error("amount too large.")]
    AmountTooLarge,
    /// Explicit split does not add up
    #[error("split must sum to amount")]
    DenominationMismatch,
    /// Denomination is not a supported power of two
    #[error("Can only mint amounts with 2^n up to {max}.")]
    UnsupportedDenomination {
        /// `2^max_order`
        max: u128,
    },
    /// Amount could not be parsed
    #[error("Invalid Amount: {0}")]
    InvalidAmount(String),
}

/// Amount can be any unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    /// Amount zero
    pub const ZERO: Amount = Amount(0);

    /// Amount one
    pub const ONE: Amount = Amount(1);

    /// Checked addition for Amount. Returns None if overflow occurs.
    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Checked subtraction for Amount. Returns None if overflow occurs.
    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    /// Try sum to check for overflow
    pub fn try_sum<I>(iter: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = Self>,
    {
        iter.into_iter().try_fold(Amount::ZERO, |acc, x| {
            acc.checked_add(x).ok_or(Error::AmountOverflow)
        })
    }

    /// Whether the amount is a power of two
    pub fn is_power_of_two(&self) -> bool {
        self.0.is_power_of_two()
    }

    /// Convert to u64
    pub fn to_u64(self) -> u64 {
        self.0
    }
}

impl Default for Amount {
    fn default() -> Self {
        Amount::ZERO
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(width) = f.width() {
            write!(f, "{:width$}", self.0, width = width)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .parse::<u64>()
            .map_err(|_| Error::InvalidAmount(s.to_owned()))?;
        Ok(Amount(value))
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<&u64> for Amount {
    fn from(value: &u64) -> Self {
        Self(*value)
    }
}

impl From<Amount> for u64 {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl std::ops::Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Self::Output {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl std::ops::Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Amount) -> Self::Output {
        Amount(self.0.saturating_sub(rhs.0))
    }
}

impl std::ops::SubAssign for Amount {
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

/// Converts amounts to and from canonical sets of power-of-two denominations
///
/// Bounded by the maximum order the mint publishes: denominations `2^0 .. 2^(max_order - 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DenominationCodec {
    max_order: u8,
}

impl Default for DenominationCodec {
    fn default() -> Self {
        Self { max_order: 64 }
    }
}

impl DenominationCodec {
    /// Create new [`DenominationCodec`], `max_order` is capped at 64
    pub fn new(max_order: u8) -> Self {
        Self {
            max_order: max_order.min(64),
        }
    }

    /// Codec matching the denominations a keyset publishes
    pub fn from_keys(keys: &Keys) -> Self {
        let max_order = keys
            .iter()
            .map(|(amount, _)| amount.to_u64())
            .max()
            .map(|largest| (64 - largest.leading_zeros()) as u8)
            .unwrap_or_default();

        Self::new(max_order)
    }

    /// Maximum order
    pub fn max_order(&self) -> u8 {
        self.max_order
    }

    /// `2^max_order`, the bound named in error messages
    pub fn order_bound(&self) -> u128 {
        1u128 << self.max_order
    }

    /// Largest amount the denominations can represent
    pub fn max_amount(&self) -> u128 {
        self.order_bound() - 1
    }

    /// Whether `amount` is one of the supported denominations
    pub fn is_supported(&self, amount: Amount) -> bool {
        amount.is_power_of_two() && amount.0.trailing_zeros() < u32::from(self.max_order)
    }

    /// Split amount into its power-of-two denominations, smallest first
    pub fn decompose(&self, amount: Amount) -> Result<Vec<Amount>, Error> {
        if u128::from(amount.0) > self.max_amount() {
            return Err(Error::AmountTooLarge);
        }

        Ok((0..self.max_order)
            .map(|order| 1u64 << order)
            .filter(|denomination| amount.0 & denomination != 0)
            .map(Amount)
            .collect())
    }

    /// Check an explicit split against `amount`
    pub fn validate_split(&self, amount: Amount, split: &[Amount]) -> Result<(), Error> {
        let total =
            Amount::try_sum(split.iter().copied()).map_err(|_| Error::DenominationMismatch)?;

        if total != amount {
            return Err(Error::DenominationMismatch);
        }

        if let Some(unsupported) = split.iter().find(|a| !self.is_supported(**a)) {
            tracing::debug!("Denomination {} is not supported", unsupported);
            return Err(Error::UnsupportedDenomination {
                max: self.order_bound(),
            });
        }

        Ok(())
    }

    /// Denominations for `amount`: the explicit split when given, otherwise [`Self::decompose`]
    pub fn plan(&self, amount: Amount, split: Option<&[Amount]>) -> Result<Vec<Amount>, Error> {
        match split {
            Some(split) => {
                self.validate_split(amount, split)?;
                Ok(split.to_vec())
            }
            None => self.decompose(amount),
        }
    }

    /// Whether `amounts` is exactly the canonical decomposition of their sum
    pub fn is_canonical(&self, amounts: &[Amount]) -> bool {
        let Ok(total) = Amount::try_sum(amounts.iter().copied()) else {
            return false;
        };

        let mut sorted = amounts.to_vec();
        sorted.sort();

        self.decompose(total)
            .map(|canonical| canonical == sorted)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amounts(values: &[u64]) -> Vec<Amount> {
        values.iter().map(Amount::from).collect()
    }

    #[test]
    fn test_decompose_amount() {
        let codec = DenominationCodec::default();

        assert_eq!(codec.decompose(Amount::from(1)).unwrap(), amounts(&[1]));
        assert_eq!(codec.decompose(Amount::from(2)).unwrap(), amounts(&[2]));
        assert_eq!(codec.decompose(Amount::from(3)).unwrap(), amounts(&[1, 2]));
        assert_eq!(codec.decompose(Amount::from(20)).unwrap(), amounts(&[4, 16]));
        assert_eq!(
            codec.decompose(Amount::from(44)).unwrap(),
            amounts(&[4, 8, 32])
        );
        assert_eq!(
            codec.decompose(Amount::from(255)).unwrap(),
            amounts(&[1, 2, 4, 8, 16, 32, 64, 128])
        );
        assert!(codec.decompose(Amount::ZERO).unwrap().is_empty());
    }

    #[test]
    fn test_decompose_sums_to_amount() {
        let codec = DenominationCodec::default();

        for value in [0u64, 7, 27, 64, 1000, 123_456_789, u64::MAX] {
            let parts = codec.decompose(Amount::from(value)).unwrap();
            assert_eq!(Amount::try_sum(parts.clone()).unwrap(), Amount::from(value));
            assert!(parts.iter().all(|p| codec.is_supported(*p)));
        }
    }

    #[test]
    fn test_decompose_bounded_by_max_order() {
        let codec = DenominationCodec::new(4);

        assert_eq!(codec.max_amount(), 15);
        assert_eq!(
            codec.decompose(Amount::from(15)).unwrap(),
            amounts(&[1, 2, 4, 8])
        );
        assert_eq!(
            codec.decompose(Amount::from(16)).unwrap_err(),
            Error::AmountTooLarge
        );
    }

    #[test]
    fn test_validate_split() {
        let codec = DenominationCodec::default();
        let split = amounts(&[1, 1, 1, 2, 2, 4, 16]);

        assert!(codec.validate_split(Amount::from(27), &split).is_ok());
        assert_eq!(
            codec.validate_split(Amount::from(28), &split),
            Err(Error::DenominationMismatch)
        );

        let err = codec
            .validate_split(Amount::from(6), &amounts(&[1, 2, 3]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Can only mint amounts with 2^n up to 18446744073709551616."
        );
    }

    #[test]
    fn test_plan_keeps_explicit_order() {
        let codec = DenominationCodec::default();
        let split = amounts(&[16, 1, 2, 8]);

        assert_eq!(codec.plan(Amount::from(27), Some(&split)).unwrap(), split);
        assert_eq!(
            codec.plan(Amount::from(27), None).unwrap(),
            amounts(&[1, 2, 8, 16])
        );
    }

    #[test]
    fn test_is_canonical() {
        let codec = DenominationCodec::default();

        assert!(codec.is_canonical(&amounts(&[8, 1])));
        assert!(!codec.is_canonical(&amounts(&[2, 2, 4])));
        assert!(codec.is_canonical(&amounts(&[16])));
    }

    #[test]
    fn test_unsupported_denomination_above_max_order() {
        let codec = DenominationCodec::new(3);

        assert!(codec.is_supported(Amount::from(4)));
        assert!(!codec.is_supported(Amount::from(8)));
        assert!(!codec.is_supported(Amount::ZERO));
        assert_eq!(
            codec.validate_split(Amount::from(8), &amounts(&[8])),
            Err(Error::UnsupportedDenomination { max: 8 })
        );
    }
}
