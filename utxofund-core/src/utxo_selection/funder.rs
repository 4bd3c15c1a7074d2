//! Funding orchestrator
//!
//! [`Funder`] wires a UTXO source and a fee calculator together for each
//! funding request:
//!
//! 1. count the outputs already in the basket and derive how many change
//!    outputs may replenish it
//! 2. construct an [`Allocator`] for the request
//! 3. build the candidate sequence (priority outputs, then source pages)
//! 4. allocate candidates until the allocator is funded or they run out
//! 5. turn the final state into a [`Funding`] or `NotEnoughFunds`
//!
//! # Usage
//!
//! ```
//! use bitcoin::Amount;
//! use utxofund_common::fee_estimation::FeeModel;
//! use utxofund_common::types::{BasketPreference, OutputId, OwnerId, ScriptType};
//! use utxofund_core::utxo_management::{InMemoryUtxoStore, StoredOutput};
//! use utxofund_core::utxo_selection::{Funder, FundingRequest};
//!
//! let owner = OwnerId(1);
//! let store = InMemoryUtxoStore::new();
//! store.insert(StoredOutput::new(OutputId(1), owner, "default", Amount::from_sat(50_000), ScriptType::P2pkh));
//!
//! let funder = Funder::new(store, FeeModel::default());
//! let request = FundingRequest::new(Amount::from_sat(10_000), owner, BasketPreference::default())
//!     .with_skeleton(44, 1);
//!
//! let funding = funder.fund(&request).unwrap();
//! assert_eq!(funding.allocated.len(), 1);
//! ```

use crate::error::{FundResult, FundingError};
use crate::utxo_selection::allocator::{AllocationParams, Allocator, ChangePolicy};
use crate::utxo_selection::candidates::CandidateSequence;
use crate::utxo_selection::types::{Funding, FundingRequest, PriorityOutput};
use crate::utxo_source::{CandidateQuery, UtxoSource};
use bitcoin::Amount;
use serde_json::json;
use std::collections::HashSet;
use utxofund_common::config::{FundingConfig, DEFAULT_PAGE_SIZE};
use utxofund_common::fee_estimation::{FeeCalculator, FeeModel};
use utxofund_common::logging::{self, LogLevel};
use utxofund_common::math::CHANGE_OUTPUT_SIZE;
use utxofund_common::types::{BasketPreference, OutputId, OwnerId};

/// Funds transactions from a UTXO source
#[derive(Debug, Clone)]
pub struct Funder<S, F> {
    source: S,
    fee_calculator: F,
    page_size: usize,
    policy: ChangePolicy,
}

impl<S: UtxoSource, F: FeeCalculator> Funder<S, F> {
    /// Create a funder with the default page size and change policy
    pub fn new(source: S, fee_calculator: F) -> Self {
        Self {
            source,
            fee_calculator,
            page_size: DEFAULT_PAGE_SIZE,
            policy: ChangePolicy::default(),
        }
    }

    /// Set the number of candidates read from the source per page
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Set how leftover value is split into change outputs
    pub fn with_change_policy(mut self, policy: ChangePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The UTXO source this funder reads from
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Select candidates covering the request's target and fee
    ///
    /// # Arguments
    /// * `request` - The target, transaction skeleton, basket and constraints
    ///
    /// # Returns
    /// * `Ok(Funding)` with the allocated candidates, change and fee
    /// * `Err(FundingError::NotEnoughFunds)` when candidates run out first
    /// * Any other `FundingError` when a collaborator or arithmetic fails
    pub fn fund(&self, request: &FundingRequest) -> FundResult<Funding> {
        let available = self
            .source
            .count_available(request.owner, &request.basket.name)?;
        let desired_utxo_count = request
            .basket
            .number_of_desired_utxos
            .saturating_sub(available)
            .max(1);

        log::debug!(
            "Funding {} sats for {} from basket '{}' ({} available, up to {} change outputs)",
            request.target.to_sat(),
            request.owner,
            request.basket.name,
            available,
            desired_utxo_count
        );

        let params = AllocationParams {
            target_value: request.target,
            current_size: request.current_size,
            output_count: request.output_count,
            desired_utxo_count,
            minimum_desired_utxo_value: request.basket.minimum_desired_utxo_value,
        };
        let mut allocator = Allocator::with_policy(params, self.policy, &self.fee_calculator)?;

        let query = CandidateQuery {
            owner: request.owner,
            basket: &request.basket.name,
            forbidden: &request.forbidden_output_ids,
            include_sending: request.include_sending,
        };
        let mut candidates = CandidateSequence::with_page_size(
            &request.priority_outputs,
            &self.source,
            query,
            self.page_size,
        );

        while !allocator.is_funded()? {
            match candidates.next() {
                Some(candidate) => allocator.allocate(candidate?)?,
                None => break,
            }
        }

        let pages_fetched = candidates.pages_fetched();
        match allocator.into_result() {
            Ok(funding) => {
                logging::log_funding(
                    LogLevel::Info,
                    "funding_completed",
                    Some(json!({
                        "owner": request.owner.0,
                        "basket": request.basket.name,
                        "target": request.target.to_sat(),
                        "inputs": funding.allocated.len(),
                        "fee": funding.fee.to_sat(),
                        "change": funding.change_value.to_sat(),
                        "change_outputs": funding.change_output_count,
                        "pages_fetched": pages_fetched,
                    })),
                );
                Ok(funding)
            }
            Err(e) => {
                if let FundingError::NotEnoughFunds { required, covered } = &e {
                    logging::log_funding(
                        LogLevel::Warn,
                        "funding_not_enough_funds",
                        Some(json!({
                            "owner": request.owner.0,
                            "basket": request.basket.name,
                            "required": required.to_sat(),
                            "covered": covered.to_sat(),
                            "pages_fetched": pages_fetched,
                        })),
                    );
                }
                Err(e)
            }
        }
    }
}

impl<S: UtxoSource> Funder<S, FeeModel> {
    /// Create a funder from the fee and selection sections of a configuration
    pub fn from_config(source: S, config: &FundingConfig) -> Self {
        Funder::new(source, config.fee.clone())
            .with_page_size(config.selection.page_size)
            .with_change_policy(ChangePolicy::new(
                config.selection.change_threshold_divisor,
                CHANGE_OUTPUT_SIZE,
            ))
    }
}

/// Fund a transaction in one call
///
/// Equivalent to building a [`FundingRequest`] and calling [`Funder::fund`]
/// with the default page size and change policy.
#[allow(clippy::too_many_arguments)]
pub fn fund<S, F>(
    source: &S,
    fee_calculator: F,
    target: Amount,
    current_size: u64,
    output_count: u64,
    basket: &BasketPreference,
    owner: OwnerId,
    forbidden_output_ids: &HashSet<OutputId>,
    priority_outputs: &[PriorityOutput],
    include_sending: bool,
) -> FundResult<Funding>
where
    S: UtxoSource + ?Sized,
    F: FeeCalculator,
{
    let request = FundingRequest {
        target,
        current_size,
        output_count,
        basket: basket.clone(),
        owner,
        forbidden_output_ids: forbidden_output_ids.clone(),
        priority_outputs: priority_outputs.to_vec(),
        include_sending,
    };

    Funder::new(source, fee_calculator).fund(&request)
}
