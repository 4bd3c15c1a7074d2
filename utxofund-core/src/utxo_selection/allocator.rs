//! The allocation state machine
//!
//! An [`Allocator`] accumulates candidates for a single funding attempt. It
//! tracks the covered value, the transaction size, the fee for that size and
//! the number of change outputs the leftover value will be split into.
//!
//! Adding an input grows the size, which raises the fee, which shrinks the
//! change, which decides how many change outputs exist, which grows the size
//! again. Each call to [`Allocator::allocate`] walks that chain once:
//!
//! 1. add the candidate's value to the covered value
//! 2. add its input size and recompute the fee
//! 3. if change remains, recount change outputs, add their size and recompute the fee
//!
//! The fee always matches the current size.
//!
//! # State
//!
//! An allocator starts out accumulating. It is funded once [`Allocator::is_funded`]
//! holds and exhausted when the caller runs out of candidates first. Both
//! outcomes are consumed by [`Allocator::into_result`], so an instance can
//! never be reused.

use crate::error::{FundResult, FundingError};
use crate::utxo_selection::types::{Candidate, Funding};
use bitcoin::Amount;
use utxofund_common::config::DEFAULT_CHANGE_THRESHOLD_DIVISOR;
use utxofund_common::fee_estimation::FeeCalculator;
use utxofund_common::math::{self, CHANGE_OUTPUT_SIZE};

/// How leftover value is split into change outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangePolicy {
    /// The minimum change threshold is the basket's minimum value divided by this
    pub threshold_divisor: u64,
    /// Size in bytes of one change output
    pub change_output_size: u64,
}

impl ChangePolicy {
    /// Create a policy; a zero divisor is treated as 1
    pub fn new(threshold_divisor: u64, change_output_size: u64) -> Self {
        Self {
            threshold_divisor: threshold_divisor.max(1),
            change_output_size,
        }
    }
}

impl Default for ChangePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_CHANGE_THRESHOLD_DIVISOR, CHANGE_OUTPUT_SIZE)
    }
}

/// The fixed inputs of one allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationParams {
    /// Value the transaction's outputs must carry
    pub target_value: Amount,
    /// Size in bytes of the transaction before any candidate is added
    pub current_size: u64,
    /// Number of outputs already defined
    pub output_count: u64,
    /// Upper bound on change outputs; values below 1 are raised to 1
    pub desired_utxo_count: u64,
    /// Preferred minimum value of each change output
    pub minimum_desired_utxo_value: Amount,
}

/// Running state of a single funding attempt
#[derive(Debug)]
pub struct Allocator<F> {
    fee_calculator: F,
    policy: ChangePolicy,
    target_value: Amount,
    current_size: u64,
    fee: Amount,
    covered_value: Amount,
    allocated: Vec<Candidate>,
    output_count: u64,
    desired_utxo_count: u64,
    minimum_desired_utxo_value: Amount,
    change_output_count: u64,
    minimum_change_threshold: Amount,
}

impl<F: FeeCalculator> Allocator<F> {
    /// Create an allocator with the default change policy
    pub fn new(params: AllocationParams, fee_calculator: F) -> FundResult<Self> {
        Self::with_policy(params, ChangePolicy::default(), fee_calculator)
    }

    /// Create an allocator with an explicit change policy
    ///
    /// The fee for the existing skeleton and its change are computed before
    /// this returns, so the initial state already satisfies the fee invariant.
    pub fn with_policy(
        params: AllocationParams,
        policy: ChangePolicy,
        fee_calculator: F,
    ) -> FundResult<Self> {
        let policy = ChangePolicy::new(policy.threshold_divisor, policy.change_output_size);
        let minimum_change_threshold = Amount::from_sat(
            params.minimum_desired_utxo_value.to_sat() / policy.threshold_divisor,
        );

        let mut allocator = Self {
            fee_calculator,
            policy,
            target_value: params.target_value,
            current_size: params.current_size,
            fee: Amount::ZERO,
            covered_value: Amount::ZERO,
            allocated: Vec::new(),
            output_count: params.output_count,
            desired_utxo_count: params.desired_utxo_count.max(1),
            minimum_desired_utxo_value: params.minimum_desired_utxo_value,
            change_output_count: 0,
            minimum_change_threshold,
        };

        allocator.recompute_fee()?;
        allocator.recompute_change()?;
        Ok(allocator)
    }

    /// Add a candidate to the allocation
    ///
    /// Any error leaves the allocator unusable for funding; the caller is
    /// expected to drop it.
    pub fn allocate(&mut self, candidate: Candidate) -> FundResult<()> {
        self.allocated.push(candidate);
        self.covered_value = math::add(self.covered_value, candidate.value)?;

        self.current_size = math::add_size(self.current_size, candidate.estimated_input_size)?;
        self.recompute_fee()?;

        self.recompute_change()?;

        log::debug!(
            "Allocated {}: covered {} sats, size {} bytes, fee {} sats, {} change outputs",
            candidate.output_id,
            self.covered_value.to_sat(),
            self.current_size,
            self.fee.to_sat(),
            self.change_output_count
        );

        Ok(())
    }

    /// Whether the covered value pays for the target and the fee
    ///
    /// When the transaction would end up with no outputs at all, strictly
    /// more than the required value must be covered so that a change output
    /// can be created. A change count left over from an earlier allocation
    /// does not count once the change is zero, since [`Allocator::into_result`]
    /// drops it.
    pub fn is_funded(&self) -> FundResult<bool> {
        let to_cover = self.to_cover()?;
        let no_change_outputs =
            self.change_output_count == 0 || self.change()? == Amount::ZERO;

        if self.output_count == 0 && no_change_outputs {
            Ok(self.covered_value > to_cover)
        } else {
            Ok(self.covered_value >= to_cover)
        }
    }

    /// Value left over after the target and fee, or zero when there is none
    pub fn change(&self) -> FundResult<Amount> {
        let to_cover = self.to_cover()?;

        if self.covered_value > to_cover {
            Ok(math::subtract(self.covered_value, to_cover)?)
        } else {
            Ok(Amount::ZERO)
        }
    }

    /// Finish the allocation
    ///
    /// Returns [`FundingError::NotEnoughFunds`] unless the allocation is funded.
    /// A funded allocation with exactly zero change reports no change outputs.
    pub fn into_result(mut self) -> FundResult<Funding> {
        if !self.is_funded()? {
            return Err(FundingError::NotEnoughFunds {
                required: self.to_cover()?,
                covered: self.covered_value,
            });
        }

        let change_value = self.change()?;
        if change_value == Amount::ZERO {
            self.change_output_count = 0;
        }

        Ok(Funding {
            allocated: self.allocated,
            change_output_count: self.change_output_count,
            change_value,
            fee: self.fee,
        })
    }

    fn to_cover(&self) -> FundResult<Amount> {
        Ok(math::add(self.target_value, self.fee)?)
    }

    fn recompute_fee(&mut self) -> FundResult<()> {
        self.fee = self.fee_calculator.compute_fee(self.current_size)?;
        Ok(())
    }

    fn recompute_change(&mut self) -> FundResult<()> {
        let change = self.change()?;
        if change == Amount::ZERO {
            return Ok(());
        }

        self.change_output_count = self.change_output_count_for(change);

        let change_outputs_size =
            math::multiply_size(self.change_output_count, self.policy.change_output_size)?;
        self.current_size = math::add_size(self.current_size, change_outputs_size)?;
        self.recompute_fee()
    }

    /// Split change into pieces of roughly the basket's minimum value. A final
    /// piece below the threshold is folded into the previous one.
    fn change_output_count_for(&self, change: Amount) -> u64 {
        let minimum = self.minimum_desired_utxo_value.to_sat();
        if minimum == 0 {
            return self.desired_utxo_count;
        }

        let change = change.to_sat();
        let mut count = change / minimum + 1;
        if change % minimum < self.minimum_change_threshold.to_sat() {
            count -= 1;
        }

        count.clamp(1, self.desired_utxo_count)
    }
}

impl<F> Allocator<F> {
    pub fn target_value(&self) -> Amount {
        self.target_value
    }

    /// Transaction size in bytes including inputs and change outputs
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    pub fn fee(&self) -> Amount {
        self.fee
    }

    pub fn covered_value(&self) -> Amount {
        self.covered_value
    }

    pub fn allocated(&self) -> &[Candidate] {
        &self.allocated
    }

    pub fn output_count(&self) -> u64 {
        self.output_count
    }

    pub fn desired_utxo_count(&self) -> u64 {
        self.desired_utxo_count
    }

    pub fn minimum_desired_utxo_value(&self) -> Amount {
        self.minimum_desired_utxo_value
    }

    pub fn change_output_count(&self) -> u64 {
        self.change_output_count
    }

    pub fn minimum_change_threshold(&self) -> Amount {
        self.minimum_change_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use utxofund_common::fee_estimation::FeeError;
    use utxofund_common::types::OutputId;

    /// One satoshi per byte
    struct PerByte;

    impl FeeCalculator for PerByte {
        fn compute_fee(&self, size: u64) -> Result<Amount, FeeError> {
            Ok(Amount::from_sat(size))
        }
    }

    fn params(target: u64, size: u64, outputs: u64, desired: u64, minimum: u64) -> AllocationParams {
        AllocationParams {
            target_value: Amount::from_sat(target),
            current_size: size,
            output_count: outputs,
            desired_utxo_count: desired,
            minimum_desired_utxo_value: Amount::from_sat(minimum),
        }
    }

    #[test]
    fn test_construction_prices_skeleton() {
        let allocator = Allocator::new(params(1000, 100, 1, 5, 500), PerByte).unwrap();
        assert_eq!(allocator.fee(), Amount::from_sat(100));
        assert_eq!(allocator.change_output_count(), 0);
        assert_eq!(allocator.minimum_change_threshold(), Amount::from_sat(125));
        assert!(!allocator.is_funded().unwrap());
    }

    #[test]
    fn test_desired_count_clamped_to_one() {
        let allocator = Allocator::new(params(1000, 100, 1, 0, 500), PerByte).unwrap();
        assert_eq!(allocator.desired_utxo_count(), 1);
    }

    #[test]
    fn test_change_count_policy() {
        let allocator = Allocator::new(params(0, 0, 1, 5, 500), PerByte).unwrap();
        let count = |sats| allocator.change_output_count_for(Amount::from_sat(sats));

        // remainder below a quarter of the minimum is folded away
        assert_eq!(count(100), 1);
        assert_eq!(count(500), 1);
        assert_eq!(count(624), 1);
        assert_eq!(count(625), 2);
        assert_eq!(count(750), 2);
        assert_eq!(count(1_124), 2);
        assert_eq!(count(1_125), 3);
        // never more than the desired count
        assert_eq!(count(1_000_000), 5);
    }

    #[test]
    fn test_zero_minimum_value_uses_desired_count() {
        let allocator = Allocator::new(params(0, 0, 1, 3, 0), PerByte).unwrap();
        assert_eq!(allocator.change_output_count_for(Amount::from_sat(10)), 3);
    }

    #[test]
    fn test_custom_threshold_divisor() {
        let policy = ChangePolicy::new(2, CHANGE_OUTPUT_SIZE);
        let allocator =
            Allocator::with_policy(params(0, 0, 1, 5, 500), policy, PerByte).unwrap();
        assert_eq!(allocator.minimum_change_threshold(), Amount::from_sat(250));
        assert_eq!(allocator.change_output_count_for(Amount::from_sat(749)), 1);
        assert_eq!(allocator.change_output_count_for(Amount::from_sat(750)), 2);
    }

    #[test]
    fn test_change_outputs_added_on_every_recount() {
        let mut allocator = Allocator::new(params(1000, 100, 1, 5, 500), PerByte).unwrap();
        allocator
            .allocate(Candidate::new(OutputId(1), Amount::from_sat(2_000), 150))
            .unwrap();
        let after_first = allocator.current_size();
        assert_eq!(after_first, 250 + 2 * CHANGE_OUTPUT_SIZE);

        allocator
            .allocate(Candidate::new(OutputId(2), Amount::from_sat(100), 150))
            .unwrap();
        // change of 632 is recounted as two outputs, sized on top of the last two
        assert_eq!(allocator.change_output_count(), 2);
        assert_eq!(allocator.current_size(), after_first + 150 + 2 * CHANGE_OUTPUT_SIZE);
        assert_eq!(allocator.fee(), Amount::from_sat(allocator.current_size()));
    }
}
