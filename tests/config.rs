use std::fs;

use taskboard::config::{Config, RollbackPolicy, CONFIG_FILE};
use taskboard::Error;

#[test]
fn partial_file_fills_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(CONFIG_FILE);
    fs::write(&path, "[tasks]\nrollback = \"refetch\"\n").expect("write config");

    let cfg = Config::load(&path).expect("load");
    assert_eq!(cfg.api.base_url, "http://localhost:3000");
    assert_eq!(cfg.api.timeout_secs, 30);
    assert_eq!(cfg.tasks.rollback, RollbackPolicy::Refetch);
}

#[test]
fn missing_file_is_config_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nope.toml");

    match Config::load(&path) {
        Err(Error::ConfigNotFound(missing)) => assert_eq!(missing, path),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn unknown_rollback_policy_is_a_parse_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(CONFIG_FILE);
    fs::write(&path, "[tasks]\nrollback = \"sometimes\"\n").expect("write config");

    let err = Config::load(&path).expect_err("bad policy");
    assert!(matches!(err, Error::TomlParse(_)), "{err:?}");
}

#[test]
fn saved_config_loads_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(CONFIG_FILE);
    let cfg = Config::default()
        .with_base_url(Some("https://board.internal:8443".to_string()))
        .expect("override");
    cfg.save(&path).expect("save");

    let loaded = Config::load_from_dir(dir.path());
    assert_eq!(loaded.api.base_url, "https://board.internal:8443");
    assert_eq!(loaded.tasks.rollback, RollbackPolicy::Restore);
}

#[test]
fn invalid_local_file_falls_back_to_defaults_in_load_from_dir() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join(CONFIG_FILE), "[api]\nbase_url = \"\"\n").expect("write config");

    let cfg = Config::load_from_dir(dir.path());
    assert_eq!(cfg.api.base_url, "http://localhost:3000");
}
