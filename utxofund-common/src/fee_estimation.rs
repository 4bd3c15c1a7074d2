//! Fee calculation for transaction sizes
//!
//! The allocator only depends on the [`FeeCalculator`] contract: a pure,
//! monotonic mapping from a transaction size in bytes to a fee. [`FeeModel`]
//! is the rate-based implementation configured from TOML.
//!
//! Rates are held as `rust_decimal::Decimal` and every fee is rounded up to
//! the next whole satoshi.

use bitcoin::Amount;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors related to fee computation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeeError {
    #[error("Invalid fee rate: {0}")]
    InvalidRate(String),

    #[error("Fee for a {size} byte transaction does not fit in a satoshi amount")]
    Overflow { size: u64 },

    #[error("Fee model unavailable: {0}")]
    Unavailable(String),
}

/// Default fee rates
pub mod defaults {
    use super::*;

    /// Default rate in satoshis per kilobyte (one satoshi per byte)
    pub fn sat_per_kb() -> Decimal {
        dec!(1000)
    }

    /// Lowest rate most relaying nodes accept, in satoshis per kilobyte
    pub fn minimum_relay_sat_per_kb() -> Decimal {
        dec!(1)
    }
}

/// Maps a transaction size to the fee that must be paid for it
pub trait FeeCalculator {
    /// Compute the fee for a transaction of `size` bytes
    fn compute_fee(&self, size: u64) -> Result<Amount, FeeError>;
}

impl<T: FeeCalculator + ?Sized> FeeCalculator for &T {
    fn compute_fee(&self, size: u64) -> Result<Amount, FeeError> {
        (**self).compute_fee(size)
    }
}

impl<T: FeeCalculator + ?Sized> FeeCalculator for Box<T> {
    fn compute_fee(&self, size: u64) -> Result<Amount, FeeError> {
        (**self).compute_fee(size)
    }
}

/// Rate-based fee model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FeeModel {
    /// Satoshis per 1000 bytes
    #[serde(rename = "sat/kb")]
    SatPerKb { value: Decimal },

    /// Satoshis per byte
    #[serde(rename = "sat/byte")]
    SatPerByte { value: Decimal },
}

impl Default for FeeModel {
    fn default() -> Self {
        FeeModel::SatPerKb {
            value: defaults::sat_per_kb(),
        }
    }
}

impl FeeModel {
    /// Create a sat/kb model
    pub fn sat_per_kb(value: Decimal) -> Self {
        FeeModel::SatPerKb { value }
    }

    /// Create a sat/byte model
    pub fn sat_per_byte(value: Decimal) -> Self {
        FeeModel::SatPerByte { value }
    }

    /// The configured rate expressed in satoshis per byte
    pub fn sats_per_byte(&self) -> Decimal {
        match self {
            FeeModel::SatPerKb { value } => *value / dec!(1000),
            FeeModel::SatPerByte { value } => *value,
        }
    }

    /// Reject rates that cannot produce a meaningful fee
    pub fn validate(&self) -> Result<(), FeeError> {
        let value = match self {
            FeeModel::SatPerKb { value } | FeeModel::SatPerByte { value } => *value,
        };

        if value < Decimal::ZERO {
            return Err(FeeError::InvalidRate(format!(
                "fee rate must not be negative, got {}",
                value
            )));
        }

        Ok(())
    }
}

impl FeeCalculator for FeeModel {
    fn compute_fee(&self, size: u64) -> Result<Amount, FeeError> {
        self.validate()?;
        calculate_total_fee(self.sats_per_byte(), size).map(Amount::from_sat)
    }
}

/// Calculate the total fee for a transaction, rounding up to a whole satoshi
///
/// # Arguments
/// * `fee_rate` - Rate in satoshis per byte
/// * `tx_size` - Transaction size in bytes
///
/// # Returns
/// The fee in satoshis
pub fn calculate_total_fee(fee_rate: Decimal, tx_size: u64) -> Result<u64, FeeError> {
    fee_rate
        .checked_mul(Decimal::from(tx_size))
        .map(|fee| fee.ceil())
        .and_then(|fee| fee.to_u64())
        .ok_or(FeeError::Overflow { size: tx_size })
}
