use anyhow::Result;
use bitcoin::Amount;
use rust_decimal_macros::dec;
use std::fs;
use tempfile::TempDir;
use utxofund_common::config::{self, FundingConfig, DEFAULT_PAGE_SIZE};
use utxofund_common::fee_estimation::FeeModel;
use utxofund_common::logging::LogLevel;

#[test]
fn test_empty_config_uses_defaults() -> Result<()> {
    let config = FundingConfig::from_toml_str("")?;

    assert_eq!(config.fee, FeeModel::default());
    assert_eq!(config.selection.page_size, DEFAULT_PAGE_SIZE);
    assert_eq!(config.selection.change_threshold_divisor, 4);
    assert!(!config.selection.include_sending);
    assert_eq!(config.basket.name, "default");
    assert_eq!(config.basket.number_of_desired_utxos, 32);
    assert_eq!(config.logging.level, LogLevel::Info);
    Ok(())
}

#[test]
fn test_parse_full_config() -> Result<()> {
    let config = FundingConfig::from_toml_str(
        r#"
        [fee]
        type = "sat/byte"
        value = "0.5"

        [selection]
        page_size = 250
        change_threshold_divisor = 2
        include_sending = true

        [basket]
        name = "payments"
        number_of_desired_utxos = 10
        minimum_desired_utxo_value = 20000

        [logging]
        level = "debug"
        json_format = true
        "#,
    )?;

    assert_eq!(config.fee, FeeModel::sat_per_byte(dec!(0.5)));
    assert_eq!(config.selection.page_size, 250);
    assert_eq!(config.selection.change_threshold_divisor, 2);
    assert!(config.selection.include_sending);
    assert_eq!(config.basket.name, "payments");
    assert_eq!(config.basket.number_of_desired_utxos, 10);
    assert_eq!(config.basket.minimum_desired_utxo_value, Amount::from_sat(20_000));
    assert_eq!(config.logging.level, LogLevel::Debug);
    assert!(config.logging.json_format);
    Ok(())
}

#[test]
fn test_validation_rejects_bad_values() {
    let cases = [
        "[selection]\npage_size = 0\n",
        "[selection]\nchange_threshold_divisor = 0\n",
        "[fee]\ntype = \"sat/kb\"\nvalue = \"-1\"\n",
        "[basket]\nname = \" \"\n",
        "[fee]\ntype = \"per-weight-unit\"\nvalue = \"1\"\n",
    ];

    for case in cases {
        assert!(
            FundingConfig::from_toml_str(case).is_err(),
            "config should be rejected: {}",
            case
        );
    }
}

#[test]
fn test_save_and_load_round_trip() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("funding.toml");

    let mut original = FundingConfig::default();
    original.fee = FeeModel::sat_per_kb(dec!(500));
    original.selection.page_size = 64;
    original.basket.name = "savings".to_string();
    original.save(&path)?;

    let loaded = FundingConfig::load(&path)?;
    assert_eq!(loaded.fee, original.fee);
    assert_eq!(loaded.selection, original.selection);
    assert_eq!(loaded.basket, original.basket);
    Ok(())
}

#[test]
fn test_ensure_config_exists_creates_default() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("nested").join("funding.toml");

    config::ensure_config_exists(&path)?;
    assert!(path.exists(), "default config file should be created");

    let loaded = FundingConfig::load(&path)?;
    assert_eq!(loaded.selection.page_size, DEFAULT_PAGE_SIZE);

    // An existing file is left untouched
    fs::write(&path, "[selection]\npage_size = 5\n")?;
    config::ensure_config_exists(&path)?;
    assert_eq!(FundingConfig::load(&path)?.selection.page_size, 5);
    Ok(())
}

#[test]
fn test_load_missing_file_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let result = FundingConfig::load(&temp_dir.path().join("missing.toml"));
    assert!(result.is_err());
}
