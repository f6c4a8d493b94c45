use std::fs;
use std::path::PathBuf;

use rust_decimal_macros::dec;
use tempfile::TempDir;

use adzengine::error::{ConfigError, Error};
use adzengine::infrastructure::config::logging::LogFormat;
use adzengine::infrastructure::config::settings::{Config, DATABASE_URL_ENV};

fn write_config(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("config.toml");
    fs::write(&path, contents).expect("write temp config");
    (dir, path)
}

#[test]
fn config_loads_every_section() {
    let (_dir, path) = write_config(
        r#"
[logging]
level = "warn"
format = "json"

[ledger]
platform_fee = 0.1
reference_attempts = 3

[matching]
top_n = 4
minimum_fund = 250

[metering]
interval_secs = 600
max_concurrent_campaigns = 2
"#,
    );

    let config = Config::load(&path).unwrap();
    assert_eq!(config.logging.level, "warn");
    assert_eq!(config.logging.format, LogFormat::Json);
    assert_eq!(config.ledger.platform_fee, dec!(0.1));
    assert_eq!(config.ledger.reference_attempts, 3);
    assert_eq!(config.matching.top_n, 4);
    assert_eq!(config.matching.minimum_fund, dec!(250));
    assert_eq!(config.metering.interval_secs, 600);
    assert_eq!(config.metering.max_concurrent_campaigns, 2);
}

#[test]
fn config_rejects_negative_platform_fee() {
    let (_dir, path) = write_config("[ledger]\nplatform_fee = -0.1\n");

    match Config::load(&path) {
        Err(Error::Config(ConfigError::InvalidValue {
            field: "platform_fee",
            ..
        })) => {}
        Err(err) => panic!("Expected invalid platform fee error, got {err}"),
        Ok(config) => panic!(
            "Expected negative fee to be rejected, got {}",
            config.ledger.platform_fee
        ),
    }
}

#[test]
fn config_rejects_zero_concurrency() {
    let (_dir, path) = write_config("[metering]\nmax_concurrent_campaigns = 0\n");

    assert!(matches!(
        Config::load(&path),
        Err(Error::Config(ConfigError::InvalidValue {
            field: "max_concurrent_campaigns",
            ..
        }))
    ));
}

#[test]
fn config_reports_missing_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let result = Config::load(dir.path().join("absent.toml"));
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::ReadFile(_)))
    ));
}

#[test]
fn environment_overrides_database_url() {
    let (_dir, path) = write_config("[database]\nurl = \"from-file.db\"\n");

    std::env::set_var(DATABASE_URL_ENV, "from-env.db");
    let result = Config::load(&path);
    std::env::remove_var(DATABASE_URL_ENV);

    assert_eq!(result.unwrap().database.url, "from-env.db");
}
