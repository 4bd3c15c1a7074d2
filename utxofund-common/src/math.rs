//! Checked value arithmetic and transaction size estimation
//!
//! Amounts are handled as `bitcoin::Amount`. The helpers here never wrap:
//! overflow, underflow and values beyond the money supply come back as
//! [`ValueError`].
//!
//! Example:
//! ```
//! use bitcoin::Amount;
//! use utxofund_common::math;
//!
//! let total = math::add(Amount::from_sat(1_500), Amount::from_sat(500)).unwrap();
//! assert_eq!(total, Amount::from_sat(2_000));
//! assert!(math::subtract(Amount::from_sat(1), Amount::from_sat(2)).is_err());
//! ```

use crate::error::ValueError;
use crate::types::{ScriptType, MAX_MONEY_SATS};
use bitcoin::Amount;

/// Locking-script type of the wallet's change outputs
pub const CHANGE_SCRIPT_TYPE: ScriptType = ScriptType::P2pkh;

/// Size in bytes of one standard change output
pub const CHANGE_OUTPUT_SIZE: u64 = output_size(CHANGE_SCRIPT_TYPE);

/// Adds two values, failing on overflow or when the total exceeds the money supply
pub fn add(a: Amount, b: Amount) -> Result<Amount, ValueError> {
    let total = a.checked_add(b).ok_or(ValueError::Overflow {
        lhs: a.to_sat(),
        rhs: b.to_sat(),
    })?;

    if total.to_sat() > MAX_MONEY_SATS {
        return Err(ValueError::ExceedsSupply(total.to_sat()));
    }

    Ok(total)
}

/// Subtracts `b` from `a`, failing when the result would be negative
pub fn subtract(a: Amount, b: Amount) -> Result<Amount, ValueError> {
    a.checked_sub(b).ok_or(ValueError::Underflow {
        lhs: a.to_sat(),
        rhs: b.to_sat(),
    })
}

/// Sums a sequence of values with the same checks as [`add`]
pub fn sum<I>(values: I) -> Result<Amount, ValueError>
where
    I: IntoIterator<Item = Amount>,
{
    values.into_iter().try_fold(Amount::ZERO, add)
}

/// Adds two byte sizes
pub fn add_size(a: u64, b: u64) -> Result<u64, ValueError> {
    a.checked_add(b)
        .ok_or_else(|| ValueError::SizeOverflow(format!("{} + {} bytes", a, b)))
}

/// Multiplies a per-item byte size by an item count
pub fn multiply_size(count: u64, size: u64) -> Result<u64, ValueError> {
    count
        .checked_mul(size)
        .ok_or_else(|| ValueError::SizeOverflow(format!("{} x {} bytes", count, size)))
}

/// Gets the estimated size in bytes of an input spending the given script type
///
/// # Arguments
/// * `script_type` - Locking-script type of the output being spent
///
/// # Returns
/// The typical size in bytes of the spending input
pub const fn estimated_input_size(script_type: ScriptType) -> u64 {
    match script_type {
        ScriptType::P2pkh => 148,      // Legacy P2PKH
        ScriptType::P2wpkh => 68,      // Native SegWit
        ScriptType::P2shP2wpkh => 91,  // Nested SegWit
        ScriptType::P2wsh => 104,      // Native SegWit multisig (depends on script size)
        ScriptType::P2tr => 58,        // Taproot single-sig
    }
}

/// Gets the size in bytes of an output locked to the given script type
pub const fn output_size(script_type: ScriptType) -> u64 {
    match script_type {
        ScriptType::P2pkh => 34,
        ScriptType::P2wpkh => 31,
        ScriptType::P2shP2wpkh => 32, // encoded as a P2SH output
        ScriptType::P2wsh => 43,
        ScriptType::P2tr => 43,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_rejects_values_beyond_supply() {
        let max = Amount::from_sat(MAX_MONEY_SATS);
        assert_eq!(add(max, Amount::ZERO).unwrap(), max);
        assert_eq!(
            add(max, Amount::from_sat(1)),
            Err(ValueError::ExceedsSupply(MAX_MONEY_SATS + 1))
        );
        assert!(matches!(
            add(Amount::from_sat(u64::MAX), Amount::from_sat(1)),
            Err(ValueError::Overflow { .. })
        ));
    }

    #[test]
    fn test_sum_propagates_failure() {
        let values = vec![Amount::from_sat(MAX_MONEY_SATS), Amount::from_sat(1), Amount::ZERO];
        assert!(sum(values).is_err());
        assert_eq!(sum(Vec::new()).unwrap(), Amount::ZERO);
    }

    #[test]
    fn test_change_output_size_matches_script_type() {
        assert_eq!(CHANGE_OUTPUT_SIZE, 34);
        assert_eq!(output_size(CHANGE_SCRIPT_TYPE), CHANGE_OUTPUT_SIZE);
    }

    #[test]
    fn test_size_helpers() {
        assert_eq!(add_size(100, 150).unwrap(), 250);
        assert_eq!(multiply_size(2, CHANGE_OUTPUT_SIZE).unwrap(), 68);
        assert!(add_size(u64::MAX, 1).is_err());
        assert!(multiply_size(u64::MAX, 2).is_err());
    }
}
