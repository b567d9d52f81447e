//! Tests for configuration resolution
//!
//! Tests that touch PADRON_* environment variables are marked #[serial]
//! so they never race each other.

use padron_common::config::{
    read_toml_config, ConfigOverrides, PadronConfig, TomlConfig, DEFAULT_BIND_ADDR,
    DEFAULT_OCR_URL, ENV_OCR_API_KEY, ENV_OCR_TIMEOUT_SECS, ENV_OCR_URL,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

fn clear_env() {
    env::remove_var(ENV_OCR_URL);
    env::remove_var(ENV_OCR_API_KEY);
    env::remove_var(ENV_OCR_TIMEOUT_SECS);
}

#[test]
#[serial]
fn test_defaults_when_nothing_configured() {
    clear_env();

    let config = PadronConfig::resolve(&ConfigOverrides::default(), TomlConfig::default());

    assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
    assert_eq!(config.log_level, "info");
    assert_eq!(config.ocr.url, DEFAULT_OCR_URL);
    assert_eq!(config.ocr.api_key, None);
    assert_eq!(config.ocr.timeout, Duration::from_secs(30));
    assert!(config.database_path.ends_with("padron.db"));
}

#[test]
#[serial]
fn test_toml_values_used_when_no_overrides() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
        database_path = "/srv/padron/padron.db"
        bind_addr = "0.0.0.0:8080"

        [logging]
        level = "debug"

        [ocr]
        url = "http://ocr.internal:9000"
        api_key = "secret"
        timeout_secs = 12
        "#,
    )
    .unwrap();

    let toml_config = read_toml_config(&path).unwrap();
    let config = PadronConfig::resolve(&ConfigOverrides::default(), toml_config);

    assert_eq!(config.database_path, PathBuf::from("/srv/padron/padron.db"));
    assert_eq!(config.bind_addr, "0.0.0.0:8080");
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.ocr.url, "http://ocr.internal:9000");
    assert_eq!(config.ocr.api_key.as_deref(), Some("secret"));
    assert_eq!(config.ocr.timeout, Duration::from_secs(12));
}

#[test]
#[serial]
fn test_cli_overrides_beat_toml() {
    clear_env();
    let toml_config = TomlConfig {
        database_path: Some(PathBuf::from("/from/toml.db")),
        bind_addr: Some("0.0.0.0:1".to_string()),
        ..TomlConfig::default()
    };
    let overrides = ConfigOverrides {
        config_file: None,
        database_path: Some(PathBuf::from("/from/cli.db")),
        bind_addr: Some("127.0.0.1:9999".to_string()),
    };

    let config = PadronConfig::resolve(&overrides, toml_config);
    assert_eq!(config.database_path, PathBuf::from("/from/cli.db"));
    assert_eq!(config.bind_addr, "127.0.0.1:9999");
}

#[test]
#[serial]
fn test_env_beats_toml_for_ocr() {
    clear_env();
    env::set_var(ENV_OCR_URL, "http://env-ocr:7000");
    env::set_var(ENV_OCR_API_KEY, "env-key");
    env::set_var(ENV_OCR_TIMEOUT_SECS, "5");

    let mut toml_config = TomlConfig::default();
    toml_config.ocr.url = Some("http://toml-ocr".to_string());
    toml_config.ocr.timeout_secs = Some(60);

    let config = PadronConfig::resolve(&ConfigOverrides::default(), toml_config);
    clear_env();

    assert_eq!(config.ocr.url, "http://env-ocr:7000");
    assert_eq!(config.ocr.api_key.as_deref(), Some("env-key"));
    assert_eq!(config.ocr.timeout, Duration::from_secs(5));
}

#[test]
#[serial]
fn test_invalid_env_timeout_falls_back() {
    clear_env();
    env::set_var(ENV_OCR_TIMEOUT_SECS, "soon");

    let mut toml_config = TomlConfig::default();
    toml_config.ocr.timeout_secs = Some(15);
    let config = PadronConfig::resolve(&ConfigOverrides::default(), toml_config);
    clear_env();

    assert_eq!(config.ocr.timeout, Duration::from_secs(15));
}

#[test]
fn test_explicit_missing_config_file_is_an_error() {
    let overrides = ConfigOverrides {
        config_file: Some(PathBuf::from("/definitely/not/here/config.toml")),
        ..ConfigOverrides::default()
    };
    assert!(PadronConfig::load(&overrides).is_err());
}

#[test]
fn test_malformed_toml_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "bind_addr = [not valid").unwrap();
    assert!(read_toml_config(&path).is_err());
}
