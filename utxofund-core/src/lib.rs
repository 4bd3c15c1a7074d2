//! utxofund core library
//!
//! The coin-selection engine of a wallet storage layer. Given a target
//! value, the transaction built so far and a pool of candidate outputs, it
//! converges on an allocation that pays the size-dependent fee and returns
//! leftover value as change outputs sized to the owner's basket policy.
//!
//! # Modules
//!
//! - `utxo_selection`: allocator, candidate sequence and funding orchestrator
//! - `utxo_source`: the paginated UTXO source contract
//! - `utxo_management`: an in-memory UTXO store implementing that contract
//! - `error`: funding error types

/// Funding error types
pub mod error;

/// UTXO allocation and funding
pub mod utxo_selection;

/// UTXO source contract
pub mod utxo_source;

/// In-memory UTXO store
pub mod utxo_management;

pub use error::{FundResult, FundingError};
pub use utxo_management::{InMemoryUtxoStore, StoredOutput, TxStatus};
pub use utxo_selection::{
    fund, Candidate, Funder, Funding, FundingRequest, PriorityOutput,
};
pub use utxo_source::{CandidateQuery, Page, SourceError, UtxoSource};

/// Version of the utxofund core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
