use super::data::{Config, DEFAULT_BASE_URL};
use super::io::ConfigError;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_load_nonexistent_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nonexistent_config.toml");

    let config = Config::load_from_path(&config_path).expect("Failed to load config");

    assert_eq!(config, Config::default());
    assert_eq!(config.base_url(), DEFAULT_BASE_URL);
    assert_eq!(config.history_key(), "chatHistory");
}

#[test]
fn test_config_persistence_lifecycle() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nested/dir/config.toml");

    // Phase 1: initial save creates parent directories
    let config = Config {
        base_url: Some("https://preinscription.example.cm".to_string()),
        ..Default::default()
    };
    config
        .save_to_path(&config_path)
        .expect("Failed to save config");
    let loaded = Config::load_from_path(&config_path).expect("Failed to load config");
    assert_eq!(loaded.base_url(), "https://preinscription.example.cm");

    // Phase 2: other fields persist alongside
    let mut config = loaded;
    config.history_key = Some("historiqueChat".to_string());
    config.data_dir = Some(PathBuf::from("/tmp/preinscription-data"));
    config
        .save_to_path(&config_path)
        .expect("Failed to save modified config");
    let loaded = Config::load_from_path(&config_path).expect("Failed to load modified config");
    assert_eq!(loaded.history_key(), "historiqueChat");
    assert_eq!(
        loaded.storage_dir().expect("storage dir"),
        PathBuf::from("/tmp/preinscription-data/storage")
    );

    // Phase 3: unset falls back to the default
    let mut config = loaded;
    config.base_url = None;
    config
        .save_to_path(&config_path)
        .expect("Failed to save unset config");
    let loaded = Config::load_from_path(&config_path).expect("Failed to load unset config");
    assert_eq!(loaded.base_url(), DEFAULT_BASE_URL);
    assert_eq!(loaded.history_key(), "historiqueChat");
}

#[test]
fn test_invalid_toml_is_a_parse_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "base_url = [unterminated").expect("write config");

    let err = Config::load_from_path(&config_path).expect_err("parse should fail");
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().starts_with("Failed to parse config at"));
}

#[test]
fn test_config_file_uses_snake_case_keys() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        "base_url = \"http://127.0.0.1:8080\"\nhistory_key = \"h\"\n",
    )
    .expect("write config");

    let config = Config::load_from_path(&config_path).expect("load config");
    assert_eq!(config.base_url(), "http://127.0.0.1:8080");
    assert_eq!(config.history_key(), "h");
    assert_eq!(config.data_dir, None);
}
