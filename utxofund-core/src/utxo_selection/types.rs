//! Types used by the allocator and the funding orchestrator

use bitcoin::Amount;
use std::collections::HashSet;
use utxofund_common::config::FundingConfig;
use utxofund_common::math;
use utxofund_common::types::{BasketPreference, OutputId, OwnerId, ScriptType};

/// An unspent output eligible for allocation
///
/// Candidates are read-only snapshots. The allocator never reserves or
/// marks them as spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Candidate {
    /// Unique (per owner) identifier of the output
    pub output_id: OutputId,
    /// Value locked in the output
    pub value: Amount,
    /// Size in bytes the spending input adds to the transaction
    pub estimated_input_size: u64,
}

impl Candidate {
    /// Create a new candidate
    pub fn new(output_id: OutputId, value: Amount, estimated_input_size: u64) -> Self {
        Self {
            output_id,
            value,
            estimated_input_size,
        }
    }

    /// Create a candidate whose input size is estimated from its script type
    pub fn for_script(output_id: OutputId, value: Amount, script_type: ScriptType) -> Self {
        Self::new(output_id, value, math::estimated_input_size(script_type))
    }
}

/// An output the caller wants spent before anything read from the source,
/// such as change from an earlier transaction that was never sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityOutput {
    pub output_id: OutputId,
    pub value: Amount,
    pub script_type: ScriptType,
}

impl PriorityOutput {
    pub fn new(output_id: OutputId, value: Amount, script_type: ScriptType) -> Self {
        Self {
            output_id,
            value,
            script_type,
        }
    }
}

impl From<&PriorityOutput> for Candidate {
    fn from(output: &PriorityOutput) -> Self {
        Candidate::for_script(output.output_id, output.value, output.script_type)
    }
}

/// Everything needed to fund one transaction
#[derive(Debug, Clone)]
pub struct FundingRequest {
    /// Value the transaction's outputs must carry
    pub target: Amount,
    /// Size in bytes of the transaction skeleton built so far
    pub current_size: u64,
    /// Number of outputs already defined on the skeleton
    pub output_count: u64,
    /// Basket to spend from and replenish
    pub basket: BasketPreference,
    /// Owner of the basket
    pub owner: OwnerId,
    /// Outputs that must not be allocated
    pub forbidden_output_ids: HashSet<OutputId>,
    /// Outputs to spend before any sourced candidate
    pub priority_outputs: Vec<PriorityOutput>,
    /// Whether outputs of transactions still being sent may be spent
    pub include_sending: bool,
}

impl FundingRequest {
    /// Create a request with an empty skeleton and no constraints
    pub fn new(target: Amount, owner: OwnerId, basket: BasketPreference) -> Self {
        Self {
            target,
            current_size: 0,
            output_count: 0,
            basket,
            owner,
            forbidden_output_ids: HashSet::new(),
            priority_outputs: Vec::new(),
            include_sending: false,
        }
    }

    /// Create a request using the configured basket and sending policy
    pub fn from_config(target: Amount, owner: OwnerId, config: &FundingConfig) -> Self {
        Self::new(target, owner, config.basket.clone())
            .with_include_sending(config.selection.include_sending)
    }

    /// Set the size and output count of the existing transaction skeleton
    pub fn with_skeleton(mut self, current_size: u64, output_count: u64) -> Self {
        self.current_size = current_size;
        self.output_count = output_count;
        self
    }

    /// Exclude outputs from allocation
    pub fn with_forbidden<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = OutputId>,
    {
        self.forbidden_output_ids.extend(ids);
        self
    }

    /// Outputs to spend first
    pub fn with_priority_outputs(mut self, outputs: Vec<PriorityOutput>) -> Self {
        self.priority_outputs = outputs;
        self
    }

    /// Allow spending outputs of transactions still being sent
    pub fn with_include_sending(mut self, include_sending: bool) -> Self {
        self.include_sending = include_sending;
        self
    }
}

/// The outcome of a successful funding attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Funding {
    /// Allocated candidates, in allocation order
    pub allocated: Vec<Candidate>,
    /// Number of change outputs to create
    pub change_output_count: u64,
    /// Total value to return across all change outputs
    pub change_value: Amount,
    /// Fee for the final transaction size
    pub fee: Amount,
}

impl Funding {
    /// Total value of the allocated candidates
    pub fn total_allocated(&self) -> Amount {
        self.allocated.iter().map(|c| c.value).sum()
    }

    /// Combined size in bytes of the inputs spending the allocated candidates
    pub fn input_size(&self) -> u64 {
        self.allocated.iter().map(|c| c.estimated_input_size).sum()
    }

    /// Whether the candidate with the given identifier was allocated
    pub fn contains(&self, output_id: OutputId) -> bool {
        self.allocated.iter().any(|c| c.output_id == output_id)
    }
}
