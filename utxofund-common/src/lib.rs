//! utxofund common library
//!
//! Shared building blocks for the funding engine: identifiers and basket
//! policy, checked value arithmetic, transaction size estimation, fee
//! calculation, configuration and logging.
//!
//! # Modules
//!
//! - `types`: Output and owner identifiers, basket preferences, script types
//! - `error`: Value arithmetic errors and error categories
//! - `math`: Checked value arithmetic and input/output size estimation
//! - `fee_estimation`: The fee calculator contract and the rate-based fee model
//! - `logging`: Logging infrastructure on top of `log` and `env_logger`
//! - `config`: TOML configuration management

/// Core domain types
pub mod types;

/// Error types for value arithmetic
pub mod error;

/// Value arithmetic and size estimation
pub mod math;

/// Fee calculation utilities
pub mod fee_estimation;

/// Logging functionality
pub mod logging;

/// Configuration management
pub mod config;

pub use config::FundingConfig;
pub use error::{ErrorCategory, ValueError};
pub use fee_estimation::{FeeCalculator, FeeError, FeeModel};
pub use types::{BasketPreference, OutputId, OwnerId, ScriptType};

/// Version of the utxofund common library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
