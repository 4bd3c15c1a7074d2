//! UTXO allocation and funding
//!
//! This module chooses which unspent outputs fund a new transaction. It
//! covers a target value plus the fee for the transaction's size and splits
//! what is left into a bounded number of change outputs that replenish the
//! owner's basket.
//!
//! # Components
//!
//! - [`allocator`]: the state machine tracking covered value, size, fee and
//!   change outputs as candidates are added
//! - [`candidates`]: the lazy candidate sequence, priority outputs first and
//!   then source pages sorted smallest-first
//! - [`funder`]: the orchestrator that runs one funding request end to end
//! - [`types`]: candidates, requests and results
//!
//! Selection is greedy and single-pass. It stops at the first funded state
//! and never searches for a cheaper combination.

pub mod allocator;
pub mod candidates;
pub mod funder;
pub mod types;

pub use allocator::{AllocationParams, Allocator, ChangePolicy};
pub use candidates::{priority_candidates, CandidateSequence, PagedCandidates};
pub use funder::{fund, Funder};
pub use types::{Candidate, Funding, FundingRequest, PriorityOutput};
