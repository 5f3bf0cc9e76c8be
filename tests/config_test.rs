use receipt_scan_rust::config::{Config, HOST_ENV, TOKEN_ENV};
use receipt_scan_rust::error::ReceiptScanError;
use receipt_scan_rust::recognizer::CoordinateOrigin;
use tempfile::tempdir;

#[test]
fn test_missing_file_gives_defaults() {
    let dir = tempdir().unwrap();
    let config = Config::load_from(&dir.path().join("none.json")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_save_and_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let mut config = Config::default();
    config.api_host = "https://invoices.example.com/".into();
    config.access_token = Some("secret".into());
    config.live_interval_ms = 500;
    config.recognizer.program = "vision-ocr".into();
    config.recognizer.origin = CoordinateOrigin::TopLeft;
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_broken_file_is_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(Config::load_from(&path), Err(ReceiptScanError::JsonParse(_))));
}

// 環境変数はプロセス共有なので1つのテストにまとめる
#[test]
fn test_env_overrides() {
    let config = Config {
        api_host: "http://localhost:3000/".into(),
        access_token: Some("from-file".into()),
        ..Default::default()
    };

    std::env::remove_var(HOST_ENV);
    std::env::remove_var(TOKEN_ENV);
    assert_eq!(config.api_host(), "http://localhost:3000");
    assert_eq!(config.access_token().as_deref(), Some("from-file"));

    std::env::set_var(HOST_ENV, "https://api.example.com/");
    std::env::set_var(TOKEN_ENV, "from-env");
    assert_eq!(config.api_host(), "https://api.example.com");
    assert_eq!(config.require_access_token().unwrap(), "from-env");

    // 空の値は無視
    std::env::set_var(TOKEN_ENV, "  ");
    assert_eq!(config.access_token().as_deref(), Some("from-file"));

    let no_token = Config::default();
    assert!(matches!(
        no_token.require_access_token(),
        Err(ReceiptScanError::MissingApiToken)
    ));

    std::env::remove_var(HOST_ENV);
    std::env::remove_var(TOKEN_ENV);
}
