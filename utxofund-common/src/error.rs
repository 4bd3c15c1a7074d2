//! Error types shared by the funding crates
//!
//! Value arithmetic never wraps or clamps. Every overflow or underflow is
//! reported as a [`ValueError`] so that the caller can abort the allocation
//! it was part of.

use thiserror::Error;

/// Errors from checked value and size arithmetic
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// Adding two values overflowed the satoshi range
    #[error("Value overflow: {lhs} + {rhs} satoshis")]
    Overflow { lhs: u64, rhs: u64 },

    /// Subtracting would produce a negative value
    #[error("Value underflow: {lhs} - {rhs} satoshis")]
    Underflow { lhs: u64, rhs: u64 },

    /// The result is larger than the total money supply
    #[error("Value of {0} satoshis exceeds the maximum money supply")]
    ExceedsSupply(u64),

    /// A transaction size computation overflowed
    #[error("Transaction size overflow: {0}")]
    SizeOverflow(String),
}

/// Error category for logging and metrics purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The candidate pool could not cover the target
    Funds,
    /// Checked arithmetic failed
    Arithmetic,
    /// The fee model rejected a size or is misconfigured
    Fee,
    /// The UTXO source failed to answer
    Source,
    /// A collaborator returned data that breaks an invariant
    Internal,
}

impl ErrorCategory {
    /// Convert the error category to a string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Funds => "Funds",
            ErrorCategory::Arithmetic => "Arithmetic",
            ErrorCategory::Fee => "Fee",
            ErrorCategory::Source => "Source",
            ErrorCategory::Internal => "Internal",
        }
    }
}
