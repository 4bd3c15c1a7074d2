//! Configuration management for funding.
//!
//! Settings are stored in TOML. Every section and field has a default, so a
//! partial file (or an empty one) is valid input.
//!
//! ```toml
//! [fee]
//! type = "sat/kb"
//! value = 1000
//!
//! [selection]
//! page_size = 1000
//! change_threshold_divisor = 4
//! include_sending = false
//!
//! [basket]
//! name = "default"
//! number_of_desired_utxos = 32
//! minimum_desired_utxo_value = 1000
//! ```

use crate::fee_estimation::FeeModel;
use crate::logging::{self, LogConfig, LogLevel};
use crate::types::BasketPreference;
use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs;
use std::path::Path;

/// Number of candidates requested from the UTXO source per page
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Divisor deriving the minimum change threshold from the basket's minimum value
pub const DEFAULT_CHANGE_THRESHOLD_DIVISOR: u64 = 4;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FundingConfig {
    #[serde(default)]
    pub fee: FeeModel,

    #[serde(default)]
    pub selection: SelectionConfig,

    /// Basket used when a request does not name its own preference
    #[serde(default)]
    pub basket: BasketPreference,

    #[serde(default)]
    pub logging: LogConfig,
}

/// Candidate sourcing and change-splitting settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// A change remainder below `minimum_desired_utxo_value / divisor` is
    /// folded into the previous change output
    #[serde(default = "default_change_threshold_divisor")]
    pub change_threshold_divisor: u64,

    /// Whether outputs of transactions still being sent may be spent
    #[serde(default)]
    pub include_sending: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            change_threshold_divisor: default_change_threshold_divisor(),
            include_sending: false,
        }
    }
}

impl FundingConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path.display(), e))?;

        let config = Self::from_toml_str(&content)?;

        logging::log_config(
            LogLevel::Debug,
            "config_loaded",
            Some(json!({ "path": path.display().to_string() })),
        );

        Ok(config)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: FundingConfig =
            toml::from_str(content).map_err(|e| anyhow!("Failed to parse config file: {}", e))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| anyhow!("Failed to serialize config: {}", e))?;

        fs::write(path, content).map_err(|e| anyhow!("Failed to write config file: {}", e))?;

        logging::log_config(
            LogLevel::Info,
            "config_saved",
            Some(json!({
                "path": path.display().to_string(),
                "page_size": self.selection.page_size,
                "basket": self.basket.name,
            })),
        );

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.selection.page_size == 0 {
            bail!("Invalid page size: must be greater than 0");
        }

        if self.selection.change_threshold_divisor == 0 {
            bail!("Invalid change threshold divisor: must be greater than 0");
        }

        self.fee
            .validate()
            .map_err(|e| anyhow!("Invalid fee model: {}", e))?;

        if self.basket.name.trim().is_empty() {
            bail!("Invalid basket: name must not be empty");
        }

        Ok(())
    }
}

/// Ensure a configuration file exists at the specified path
/// If it doesn't exist, create it with default values
pub fn ensure_config_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        let content = toml::to_string_pretty(&FundingConfig::default())
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(|e| anyhow!("Failed to create config directory: {}", e))?;
            }
        }

        fs::write(path, content)
            .map_err(|e| anyhow!("Failed to write default config file: {}", e))?;
    }

    Ok(())
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_change_threshold_divisor() -> u64 {
    DEFAULT_CHANGE_THRESHOLD_DIVISOR
}
