use chrono::{TimeZone, Utc};
use serial_test::serial;
use std::env;
use std::fs::write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

use gitlab_contributors::load_config::{build_run_config, load_config, FileConfig, Overrides, TOKEN_ENV};
use gitlab_contributors::model::TargetScope;

#[test]
#[serial]
fn test_load_config_groups_from_file_token_from_env() {
    let config_yaml = r#"
url: https://git.corp.example/
groups:
  - platform
  - data
since: 2024-01-01
output_dir: ./tmp/reports
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();
    env::set_var(TOKEN_ENV, "from-env");

    let file = load_config(config_file.path()).expect("Config should load");
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let config = build_run_config(file, Overrides::default(), now).expect("Config should merge");

    assert_eq!(config.target.url, "https://git.corp.example/");
    assert_eq!(config.target.token, "from-env");
    assert_eq!(
        config.target.scope,
        TargetScope::Groups(vec!["platform".to_string(), "data".to_string()])
    );
    assert_eq!(config.since, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    assert_eq!(config.output_dir, PathBuf::from("./tmp/reports"));
}

#[test]
#[serial]
fn test_flags_override_file_and_project_wins_over_groups() {
    env::remove_var(TOKEN_ENV);
    let file = FileConfig {
        groups: vec!["platform".to_string()],
        since: Some("2023-01-01".to_string()),
        ..Default::default()
    };
    let overrides = Overrides {
        token: Some("from-flag".to_string()),
        project: Some("org/repo".to_string()),
        since: Some("2024-03-15T12:30:00+02:00".to_string()),
        ..Default::default()
    };

    let config = build_run_config(file, overrides, Utc::now()).expect("Config should merge");

    assert_eq!(config.target.token, "from-flag");
    assert_eq!(config.target.url, "https://gitlab.com/");
    assert_eq!(config.target.scope, TargetScope::Project("org/repo".to_string()));
    assert_eq!(config.since, Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap());
}

#[test]
#[serial]
fn test_defaults_to_all_visible_and_three_month_window() {
    env::set_var(TOKEN_ENV, "from-env");
    let now = Utc.with_ymd_and_hms(2024, 5, 31, 8, 0, 0).unwrap();

    let config = build_run_config(FileConfig::default(), Overrides::default(), now).expect("Config should merge");

    assert_eq!(config.target.scope, TargetScope::AllVisible);
    assert_eq!(config.since, Utc.with_ymd_and_hms(2024, 2, 29, 8, 0, 0).unwrap());
    assert_eq!(config.output_dir, PathBuf::from("."));
}

#[test]
#[serial]
fn test_missing_token_is_an_error() {
    env::remove_var(TOKEN_ENV);
    let err = build_run_config(FileConfig::default(), Overrides::default(), Utc::now()).unwrap_err();
    assert!(err.to_string().contains(TOKEN_ENV), "got: {err}");
}

#[test]
#[serial]
fn test_invalid_since_is_an_error() {
    let overrides = Overrides {
        token: Some("t".to_string()),
        since: Some("last tuesday".to_string()),
        ..Default::default()
    };
    let err = build_run_config(FileConfig::default(), overrides, Utc::now()).unwrap_err();
    assert!(err.to_string().contains("Invalid since date"), "got: {err}");
}

#[test]
fn test_load_config_errors_for_invalid_file() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), b"groups: [:::").unwrap();

    let err = load_config(config_file.path()).unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.contains("parse") || msg.contains("YAML"),
        "Parse error expected, got: {msg}"
    );
}

#[test]
fn test_load_config_rejects_token_in_file() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), b"token: secret\n").unwrap();
    assert!(load_config(config_file.path()).is_err());
}

#[test]
fn test_empty_config_file_is_all_defaults() {
    let config_file = NamedTempFile::new().expect("temp file");
    let file = load_config(config_file.path()).expect("Empty file should load");
    assert_eq!(file, FileConfig::default());
}
