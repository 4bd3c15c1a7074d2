//! Core domain types shared by the funding crates
//!
//! Identifiers for outputs and owners, the basket policy that bounds
//! change splitting, and the locking-script types the size estimator
//! understands.

use bitcoin::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of satoshis in one bitcoin
pub const SATS_PER_BTC: u64 = 100_000_000;

/// Maximum money supply in satoshis (21 million BTC)
pub const MAX_MONEY_SATS: u64 = 21_000_000 * SATS_PER_BTC;

/// Identifier of a stored output. Unique per owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputId(pub u64);

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "output#{}", self.0)
    }
}

impl From<u64> for OutputId {
    fn from(id: u64) -> Self {
        OutputId(id)
    }
}

/// Identifier of the wallet user that owns outputs and baskets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub u64);

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "owner#{}", self.0)
    }
}

impl From<u64> for OwnerId {
    fn from(id: u64) -> Self {
        OwnerId(id)
    }
}

/// Policy describing how many outputs of at least which value an owner
/// wants to keep in a named basket.
///
/// The preference only bounds how change is split. It never filters which
/// outputs are selected as inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketPreference {
    /// Basket name, e.g. "default"
    #[serde(default = "default_basket_name")]
    pub name: String,

    /// Number of outputs the owner wants to maintain in the basket
    #[serde(default = "default_desired_utxos")]
    pub number_of_desired_utxos: u64,

    /// Smallest value a replenishing change output should carry
    #[serde(
        default = "default_minimum_utxo_value",
        serialize_with = "sats::serialize",
        deserialize_with = "sats::deserialize"
    )]
    pub minimum_desired_utxo_value: Amount,
}

impl BasketPreference {
    /// Create a basket preference
    ///
    /// # Arguments
    /// * `name` - Basket name
    /// * `number_of_desired_utxos` - How many outputs the basket should hold
    /// * `minimum_desired_utxo_value` - Minimum value of each replenishing output
    pub fn new(
        name: impl Into<String>,
        number_of_desired_utxos: u64,
        minimum_desired_utxo_value: Amount,
    ) -> Self {
        Self {
            name: name.into(),
            number_of_desired_utxos,
            minimum_desired_utxo_value,
        }
    }
}

impl Default for BasketPreference {
    fn default() -> Self {
        Self {
            name: default_basket_name(),
            number_of_desired_utxos: default_desired_utxos(),
            minimum_desired_utxo_value: default_minimum_utxo_value(),
        }
    }
}

fn default_basket_name() -> String {
    "default".to_string()
}

fn default_desired_utxos() -> u64 {
    32
}

fn default_minimum_utxo_value() -> Amount {
    Amount::from_sat(1000)
}

/// Locking-script types with known input and output sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ScriptType {
    /// Pay to Public Key Hash (legacy)
    P2pkh,
    /// Pay to Witness Public Key Hash (native SegWit)
    P2wpkh,
    /// P2WPKH nested in P2SH (wrapped SegWit)
    P2shP2wpkh,
    /// Pay to Witness Script Hash
    P2wsh,
    /// Pay to Taproot
    P2tr,
}

impl ScriptType {
    /// Canonical lowercase name, as used in configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptType::P2pkh => "p2pkh",
            ScriptType::P2wpkh => "p2wpkh",
            ScriptType::P2shP2wpkh => "p2sh-p2wpkh",
            ScriptType::P2wsh => "p2wsh",
            ScriptType::P2tr => "p2tr",
        }
    }
}

impl fmt::Display for ScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A script type name that the size estimator does not know
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown script type: {0}")]
pub struct UnknownScriptType(pub String);

impl FromStr for ScriptType {
    type Err = UnknownScriptType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "p2pkh" => Ok(ScriptType::P2pkh),
            "p2wpkh" => Ok(ScriptType::P2wpkh),
            "p2sh-p2wpkh" => Ok(ScriptType::P2shP2wpkh),
            "p2wsh" => Ok(ScriptType::P2wsh),
            "p2tr" => Ok(ScriptType::P2tr),
            _ => Err(UnknownScriptType(s.to_string())),
        }
    }
}

impl TryFrom<String> for ScriptType {
    type Error = UnknownScriptType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ScriptType> for String {
    fn from(script_type: ScriptType) -> Self {
        script_type.as_str().to_string()
    }
}

/// Serde helpers storing an `Amount` as a plain satoshi count
pub mod sats {
    use bitcoin::Amount;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(amount.to_sat())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        u64::deserialize(deserializer).map(Amount::from_sat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_type_parsing() {
        assert_eq!("P2PKH".parse::<ScriptType>().unwrap(), ScriptType::P2pkh);
        assert_eq!("p2sh-p2wpkh".parse::<ScriptType>().unwrap(), ScriptType::P2shP2wpkh);
        assert!("p2ms".parse::<ScriptType>().is_err());

        for script_type in [
            ScriptType::P2pkh,
            ScriptType::P2wpkh,
            ScriptType::P2shP2wpkh,
            ScriptType::P2wsh,
            ScriptType::P2tr,
        ] {
            assert_eq!(script_type.to_string().parse::<ScriptType>().unwrap(), script_type);
        }
    }

    #[test]
    fn test_basket_preference_serde() {
        let basket = BasketPreference::new("savings", 8, Amount::from_sat(5_000));
        let json = serde_json::to_string(&basket).unwrap();
        assert!(json.contains("\"minimum_desired_utxo_value\":5000"));

        let parsed: BasketPreference = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, basket);

        let defaulted: BasketPreference = serde_json::from_str("{}").unwrap();
        assert_eq!(defaulted, BasketPreference::default());
    }
}
