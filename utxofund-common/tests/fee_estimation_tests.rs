use bitcoin::Amount;
use quickcheck_macros::quickcheck;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use utxofund_common::fee_estimation::{calculate_total_fee, defaults, FeeCalculator, FeeError, FeeModel};

#[test]
fn test_default_model_is_one_sat_per_byte() {
    let model = FeeModel::default();
    assert_eq!(model, FeeModel::sat_per_kb(defaults::sat_per_kb()));
    assert_eq!(model.sats_per_byte(), dec!(1));
    assert_eq!(model.compute_fee(250).unwrap(), Amount::from_sat(250));
}

#[test]
fn test_fractional_rates_round_up() {
    assert_eq!(calculate_total_fee(dec!(0.5), 3).unwrap(), 2);
    assert_eq!(calculate_total_fee(dec!(1.1), 10).unwrap(), 11);
    assert_eq!(calculate_total_fee(dec!(0.001), 1).unwrap(), 1);
    assert_eq!(calculate_total_fee(Decimal::ZERO, 1_000).unwrap(), 0);
}

#[test]
fn test_overflowing_fee_is_an_error() {
    let result = calculate_total_fee(Decimal::MAX, u64::MAX);
    assert_eq!(result, Err(FeeError::Overflow { size: u64::MAX }));
}

#[test]
fn test_calculator_through_references() {
    let model = FeeModel::sat_per_byte(dec!(2));
    let by_ref: &dyn FeeCalculator = &model;
    let boxed: Box<dyn FeeCalculator> = Box::new(model.clone());

    assert_eq!(by_ref.compute_fee(100).unwrap(), Amount::from_sat(200));
    assert_eq!(boxed.compute_fee(100).unwrap(), Amount::from_sat(200));
}

#[test]
fn test_minimum_relay_rate() {
    let model = FeeModel::sat_per_kb(defaults::minimum_relay_sat_per_kb());
    assert_eq!(model.compute_fee(226).unwrap(), Amount::from_sat(1));
}

#[quickcheck]
fn fee_is_monotonic_in_size(a: u32, b: u32, rate_millis: u16) -> bool {
    let model = FeeModel::sat_per_kb(Decimal::from(rate_millis));
    let (small, large) = if a <= b { (a, b) } else { (b, a) };

    let small_fee = model.compute_fee(small as u64).unwrap();
    let large_fee = model.compute_fee(large as u64).unwrap();
    small_fee <= large_fee
}
