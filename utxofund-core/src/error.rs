//! Error handling for funding requests
//!
//! Every failure is local to one `fund` call and nothing is returned
//! alongside an error. Callers that only care about the defining failure
//! mode can use [`FundingError::is_not_enough_funds`].
//!
//! # Usage
//!
//! ```
//! use utxofund_core::error::FundingError;
//! use bitcoin::Amount;
//!
//! let err = FundingError::NotEnoughFunds {
//!     required: Amount::from_sat(1_250),
//!     covered: Amount::from_sat(900),
//! };
//! assert!(err.is_not_enough_funds());
//! ```

use crate::utxo_source::SourceError;
use bitcoin::Amount;
use thiserror::Error;
use utxofund_common::error::{ErrorCategory, ValueError};
use utxofund_common::fee_estimation::FeeError;

/// The error type for a funding attempt
#[derive(Debug, Error)]
pub enum FundingError {
    /// Candidates ran out before the target plus fee was covered
    #[error(
        "Not enough funds: required {} sats, covered {} sats",
        .required.to_sat(),
        .covered.to_sat()
    )]
    NotEnoughFunds { required: Amount, covered: Amount },

    /// Checked value or size arithmetic failed
    #[error("Arithmetic error: {0}")]
    Value(#[from] ValueError),

    /// The fee calculator rejected a transaction size
    #[error("Fee computation failed: {0}")]
    Fee(#[from] FeeError),

    /// The UTXO source failed to count or page candidates
    #[error("UTXO source error: {0}")]
    Source(#[source] SourceError),

    /// A collaborator returned data that cannot be valid
    #[error("Internal invariant violated: {context}")]
    InternalInvariant { context: String },
}

impl From<SourceError> for FundingError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::CorruptRecord { .. } => FundingError::InternalInvariant {
                context: err.to_string(),
            },
            other => FundingError::Source(other),
        }
    }
}

impl FundingError {
    /// Whether the failure is the ordinary "ran out of money" outcome
    pub fn is_not_enough_funds(&self) -> bool {
        matches!(self, FundingError::NotEnoughFunds { .. })
    }

    /// Get the category of this error for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            FundingError::NotEnoughFunds { .. } => ErrorCategory::Funds,
            FundingError::Value(_) => ErrorCategory::Arithmetic,
            FundingError::Fee(_) => ErrorCategory::Fee,
            FundingError::Source(_) => ErrorCategory::Source,
            FundingError::InternalInvariant { .. } => ErrorCategory::Internal,
        }
    }
}

/// Type alias for a Result with FundingError
pub type FundResult<T> = Result<T, FundingError>;
