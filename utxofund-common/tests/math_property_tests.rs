//! Property-based tests for the math module
//!
//! These tests use quickcheck to verify the checked arithmetic never
//! wraps and agrees with plain integer arithmetic whenever it succeeds.

use bitcoin::Amount;
use quickcheck::{Arbitrary, Gen, TestResult};
use quickcheck_macros::quickcheck;
use utxofund_common::error::ValueError;
use utxofund_common::math;
use utxofund_common::types::{ScriptType, MAX_MONEY_SATS};

// Helper to generate valid satoshi amounts
#[derive(Clone, Debug)]
struct ValidSatoshiAmount(u64);

impl Arbitrary for ValidSatoshiAmount {
    fn arbitrary(g: &mut Gen) -> Self {
        ValidSatoshiAmount(u64::arbitrary(g) % (MAX_MONEY_SATS + 1))
    }
}

#[quickcheck]
fn add_is_commutative(a: ValidSatoshiAmount, b: ValidSatoshiAmount) -> bool {
    let (a, b) = (Amount::from_sat(a.0), Amount::from_sat(b.0));
    math::add(a, b) == math::add(b, a)
}

#[quickcheck]
fn add_succeeds_exactly_within_supply(a: ValidSatoshiAmount, b: ValidSatoshiAmount) -> bool {
    let result = math::add(Amount::from_sat(a.0), Amount::from_sat(b.0));
    let expected = a.0 + b.0;

    if expected <= MAX_MONEY_SATS {
        result == Ok(Amount::from_sat(expected))
    } else {
        result == Err(ValueError::ExceedsSupply(expected))
    }
}

#[quickcheck]
fn subtract_undoes_add(a: ValidSatoshiAmount, b: ValidSatoshiAmount) -> TestResult {
    let (a, b) = (Amount::from_sat(a.0), Amount::from_sat(b.0));
    match math::add(a, b) {
        Ok(total) => TestResult::from_bool(math::subtract(total, b) == Ok(a)),
        Err(_) => TestResult::discard(),
    }
}

#[quickcheck]
fn subtract_never_goes_negative(a: u64, b: u64) -> bool {
    let result = math::subtract(Amount::from_sat(a), Amount::from_sat(b));
    if b > a {
        result == Err(ValueError::Underflow { lhs: a, rhs: b })
    } else {
        result == Ok(Amount::from_sat(a - b))
    }
}

#[quickcheck]
fn sum_matches_repeated_add(values: Vec<u32>) -> bool {
    let amounts: Vec<Amount> = values.iter().map(|v| Amount::from_sat(*v as u64)).collect();
    let expected: u64 = values.iter().map(|v| *v as u64).sum();
    math::sum(amounts) == Ok(Amount::from_sat(expected))
}

#[test]
fn test_input_sizes_by_script_type() {
    assert_eq!(math::estimated_input_size(ScriptType::P2pkh), 148);
    assert_eq!(math::estimated_input_size(ScriptType::P2wpkh), 68);
    assert_eq!(math::estimated_input_size(ScriptType::P2shP2wpkh), 91);
    assert_eq!(math::estimated_input_size(ScriptType::P2wsh), 104);
    assert_eq!(math::estimated_input_size(ScriptType::P2tr), 58);
}

#[test]
fn test_legacy_inputs_cost_most() {
    let legacy = math::estimated_input_size(ScriptType::P2pkh);
    for script_type in [
        ScriptType::P2wpkh,
        ScriptType::P2shP2wpkh,
        ScriptType::P2wsh,
        ScriptType::P2tr,
    ] {
        assert!(math::estimated_input_size(script_type) < legacy);
    }
}
