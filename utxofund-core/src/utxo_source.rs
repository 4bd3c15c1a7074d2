//! The UTXO source contract
//!
//! A source answers two questions for the funding engine: which unreserved
//! outputs of an owner's basket may be spent (one page at a time, smallest
//! value first) and how many outputs the basket currently holds.
//!
//! Sources are shared by concurrent funding attempts, so implementations
//! must be `Send + Sync` and must never hand out an output that is being
//! reserved elsewhere at the time of the read.

use crate::utxo_selection::types::Candidate;
use std::collections::HashSet;
use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;
use utxofund_common::types::{OutputId, OwnerId};

/// Errors raised by a UTXO source
#[derive(Debug, Error)]
pub enum SourceError {
    /// The backing store cannot be reached
    #[error("UTXO source unavailable: {0}")]
    Unavailable(String),

    /// A read failed
    #[error("UTXO query failed: {context}")]
    Query {
        context: String,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },

    /// A stored record cannot describe a spendable output
    #[error("Corrupt output record {output_id}: {reason}")]
    CorruptRecord { output_id: OutputId, reason: String },
}

impl SourceError {
    /// Create a query error wrapping its cause
    pub fn query<S: Into<String>, E: StdError + Send + Sync + 'static>(
        context: S,
        source: E,
    ) -> Self {
        SourceError::Query {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// The filter applied to every page read of one funding attempt
#[derive(Debug, Clone, Copy)]
pub struct CandidateQuery<'a> {
    /// Owner whose outputs may be spent
    pub owner: OwnerId,
    /// Basket to read from
    pub basket: &'a str,
    /// Outputs that must never be returned
    pub forbidden: &'a HashSet<OutputId>,
    /// Whether outputs of transactions still being sent are eligible
    pub include_sending: bool,
}

/// A window into the value-sorted candidate list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

impl Page {
    /// The first page of the given size
    pub fn first(limit: usize) -> Self {
        Page { offset: 0, limit }
    }

    /// The page immediately after this one
    pub fn next(self) -> Self {
        Page {
            offset: self.offset.saturating_add(self.limit),
            limit: self.limit,
        }
    }
}

/// Paginated, value-sorted access to spendable outputs
pub trait UtxoSource: Send + Sync {
    /// Fetch one page of spendable candidates
    ///
    /// Candidates must be sorted ascending by value and must not include
    /// any output listed in `query.forbidden`. A page shorter than
    /// `page.limit` signals that no further pages exist.
    fn find_candidates(
        &self,
        query: &CandidateQuery<'_>,
        page: Page,
    ) -> Result<Vec<Candidate>, SourceError>;

    /// Count the outputs currently available in a basket
    fn count_available(&self, owner: OwnerId, basket: &str) -> Result<u64, SourceError>;
}

impl<T: UtxoSource + ?Sized> UtxoSource for &T {
    fn find_candidates(
        &self,
        query: &CandidateQuery<'_>,
        page: Page,
    ) -> Result<Vec<Candidate>, SourceError> {
        (**self).find_candidates(query, page)
    }

    fn count_available(&self, owner: OwnerId, basket: &str) -> Result<u64, SourceError> {
        (**self).count_available(owner, basket)
    }
}

impl<T: UtxoSource + ?Sized> UtxoSource for Arc<T> {
    fn find_candidates(
        &self,
        query: &CandidateQuery<'_>,
        page: Page,
    ) -> Result<Vec<Candidate>, SourceError> {
        (**self).find_candidates(query, page)
    }

    fn count_available(&self, owner: OwnerId, basket: &str) -> Result<u64, SourceError> {
        (**self).count_available(owner, basket)
    }
}
