use std::fs;
use stratus::config::Config;

#[test]
fn save_and_load_yaml_roundtrip() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("config.yaml");

    let mut cfg = Config::default();
    cfg.api.base_url = "https://cloud.example.test".to_string();
    cfg.poll_interval_seconds = 600;
    cfg.logging.file = path.with_extension("log").to_string_lossy().to_string();

    cfg.save_to_file(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();

    assert_eq!(loaded.api.base_url, "https://cloud.example.test");
    assert_eq!(loaded.poll_interval_seconds, 600);
    assert_eq!(loaded.logging.file, cfg.logging.file);
}

#[test]
fn config_validation_errors() {
    let mut cfg = Config::default();

    // Empty base URL
    cfg.api.base_url.clear();
    assert!(cfg.validate().is_err());

    // Wrong scheme
    cfg = Config::default();
    cfg.api.base_url = "gopher://cloud".to_string();
    assert!(cfg.validate().is_err());

    // Zero timeout
    cfg = Config::default();
    cfg.api.timeout_seconds = 0;
    assert!(cfg.validate().is_err());

    // Poll interval under the upstream rate-limit floor
    cfg = Config::default();
    cfg.poll_interval_seconds = 10;
    assert!(cfg.validate().is_err());

    // Empty identity client id
    cfg = Config::default();
    cfg.identity.client_id.clear();
    assert!(cfg.validate().is_err());
}

#[test]
fn from_file_with_invalid_yaml_fails() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    fs::write(tmp.path(), b"bad: [unclosed").unwrap();
    let err = Config::from_file(tmp.path()).unwrap_err();
    let msg = format!("{}", err);
    assert!(msg.contains("Serialization error"));
}
