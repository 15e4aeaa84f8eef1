//! Configuration resolution tests
//!
//! Covers priority order (environment → TOML → compiled default), treatment of
//! blank values, and fail-fast behaviour for required secrets.
//!
//! Note: Uses serial_test to prevent environment variable races. Every test
//! that touches the process environment is marked #[serial].

use agrisync_common::config::{Config, ConfigKey, TomlConfig, DEFAULT_BIND, DEFAULT_WEBDRIVER_URL};
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn clear(keys: &[ConfigKey]) {
    for key in keys {
        env::remove_var(key.env_var());
    }
}

#[test]
#[serial]
fn test_environment_overrides_toml() {
    clear(&[ConfigKey::SpreadsheetId]);
    let config = Config::from_toml(TomlConfig {
        spreadsheet_id: Some("from-toml".to_string()),
        ..Default::default()
    });

    assert_eq!(config.get(ConfigKey::SpreadsheetId).as_deref(), Some("from-toml"));

    env::set_var("SPREADSHEET_ID", "from-env");
    assert_eq!(config.get(ConfigKey::SpreadsheetId).as_deref(), Some("from-env"));

    env::remove_var("SPREADSHEET_ID");
}

#[test]
#[serial]
fn test_blank_environment_falls_through() {
    env::set_var("BOT_TOKEN", "   ");
    let config = Config::from_toml(TomlConfig {
        bot_token: Some("xoxb-toml".to_string()),
        ..Default::default()
    });

    assert_eq!(config.get(ConfigKey::BotToken).as_deref(), Some("xoxb-toml"));

    env::remove_var("BOT_TOKEN");
}

#[test]
#[serial]
fn test_compiled_defaults_for_non_secrets() {
    clear(&[ConfigKey::WebdriverUrl, ConfigKey::Bind, ConfigKey::TmpDir]);
    let config = Config::from_toml(TomlConfig::default());

    assert_eq!(config.get(ConfigKey::WebdriverUrl).as_deref(), Some(DEFAULT_WEBDRIVER_URL));
    assert_eq!(config.get(ConfigKey::Bind).as_deref(), Some(DEFAULT_BIND));
    assert_eq!(config.tmp_dir(), PathBuf::from("/tmp"));
}

#[test]
#[serial]
fn test_secrets_have_no_default() {
    clear(&[ConfigKey::SigningSecret, ConfigKey::AgriNoteId, ConfigKey::AgriNotePass]);
    let config = Config::from_toml(TomlConfig::default());

    assert!(config.get(ConfigKey::SigningSecret).is_none());
    let err = config.require(ConfigKey::SigningSecret).unwrap_err();
    assert!(err.to_string().contains("SIGNING_SECRET"));
    assert!(config.portal_credentials().is_err());
}

#[test]
#[serial]
fn test_portal_credentials_resolved() {
    env::set_var("AGRI_NOTE_ID", "farm-01");
    env::set_var("AGRI_NOTE_PASS", "pw");
    let config = Config::from_toml(TomlConfig::default());

    let creds = config.portal_credentials().unwrap();
    assert_eq!(creds.identifier, "farm-01");
    assert_eq!(creds.secret, "pw");

    clear(&[ConfigKey::AgriNoteId, ConfigKey::AgriNotePass]);
}

#[test]
fn test_toml_file_parsing() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
spreadsheet_id = "sheet-123"
tmp_dir = "/var/tmp/agrisync"
schedule = "0 0 6 * * *"
"#
    )
    .unwrap();

    let toml = TomlConfig::from_file(file.path()).unwrap();
    assert_eq!(toml.spreadsheet_id.as_deref(), Some("sheet-123"));
    assert_eq!(toml.tmp_dir, Some(PathBuf::from("/var/tmp/agrisync")));
    assert_eq!(toml.schedule.as_deref(), Some("0 0 6 * * *"));
    assert!(toml.bot_token.is_none());
}

#[test]
fn test_malformed_toml_is_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "spreadsheet_id = [unterminated").unwrap();

    let err = TomlConfig::from_file(file.path()).unwrap_err();
    assert!(err.to_string().starts_with("Configuration error"));
}
