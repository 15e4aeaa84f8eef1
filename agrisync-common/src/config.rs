//! Configuration loading and resolution
//!
//! Every setting resolves in this priority order:
//! 1. Environment variable (highest priority; a `.env` file in the working
//!    directory is loaded into the environment first)
//! 2. TOML config file
//! 3. Compiled default (non-secret settings only)
//!
//! Secrets (bot token, signing secret, portal credentials, service account)
//! have no compiled default.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default WebDriver endpoint (chromedriver's default port)
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

/// Default transient directory for downloads and extracted workbooks
pub const DEFAULT_TMP_DIR: &str = "/tmp";

/// Default relay listen address
pub const DEFAULT_BIND: &str = "127.0.0.1:5780";

/// Default scraper executable launched by the relay
pub const DEFAULT_SCRAPER_BIN: &str = "agrisync-scraper";

/// Settings that can be read from the environment or the TOML file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    BotToken,
    SigningSecret,
    AgriNoteId,
    AgriNotePass,
    SpreadsheetId,
    ServiceAccountJson,
    WebdriverUrl,
    TmpDir,
    Bind,
    ScraperBin,
    Schedule,
}

impl ConfigKey {
    /// Environment variable name
    pub fn env_var(self) -> &'static str {
        match self {
            ConfigKey::BotToken => "BOT_TOKEN",
            ConfigKey::SigningSecret => "SIGNING_SECRET",
            ConfigKey::AgriNoteId => "AGRI_NOTE_ID",
            ConfigKey::AgriNotePass => "AGRI_NOTE_PASS",
            ConfigKey::SpreadsheetId => "SPREADSHEET_ID",
            ConfigKey::ServiceAccountJson => "SERVICE_ACCOUNT_JSON",
            ConfigKey::WebdriverUrl => "WEBDRIVER_URL",
            ConfigKey::TmpDir => "AGRISYNC_TMP_DIR",
            ConfigKey::Bind => "AGRISYNC_BIND",
            ConfigKey::ScraperBin => "AGRISYNC_SCRAPER_BIN",
            ConfigKey::Schedule => "AGRISYNC_SCHEDULE",
        }
    }

    fn compiled_default(self) -> Option<&'static str> {
        match self {
            ConfigKey::WebdriverUrl => Some(DEFAULT_WEBDRIVER_URL),
            ConfigKey::TmpDir => Some(DEFAULT_TMP_DIR),
            ConfigKey::Bind => Some(DEFAULT_BIND),
            ConfigKey::ScraperBin => Some(DEFAULT_SCRAPER_BIN),
            _ => None,
        }
    }
}

/// On-disk configuration file (`config.toml`)
///
/// All fields are optional; a missing file is equivalent to an empty one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    pub bot_token: Option<String>,
    pub signing_secret: Option<String>,
    pub agri_note_id: Option<String>,
    pub agri_note_pass: Option<String>,
    pub spreadsheet_id: Option<String>,
    pub service_account_json: Option<String>,
    pub webdriver_url: Option<String>,
    pub tmp_dir: Option<PathBuf>,
    pub bind: Option<String>,
    pub scraper_bin: Option<String>,
    pub schedule: Option<String>,
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    fn value(&self, key: ConfigKey) -> Option<String> {
        match key {
            ConfigKey::BotToken => self.bot_token.clone(),
            ConfigKey::SigningSecret => self.signing_secret.clone(),
            ConfigKey::AgriNoteId => self.agri_note_id.clone(),
            ConfigKey::AgriNotePass => self.agri_note_pass.clone(),
            ConfigKey::SpreadsheetId => self.spreadsheet_id.clone(),
            ConfigKey::ServiceAccountJson => self.service_account_json.clone(),
            ConfigKey::WebdriverUrl => self.webdriver_url.clone(),
            ConfigKey::TmpDir => self.tmp_dir.as_ref().map(|p| p.display().to_string()),
            ConfigKey::Bind => self.bind.clone(),
            ConfigKey::ScraperBin => self.scraper_bin.clone(),
            ConfigKey::Schedule => self.schedule.clone(),
        }
    }
}

/// Resolved view over environment + TOML file + compiled defaults
#[derive(Debug, Clone, Default)]
pub struct Config {
    toml: TomlConfig,
}

impl Config {
    /// Load `.env`, then the first TOML config file found on this platform
    ///
    /// A missing or unreadable config file is not an error: the environment
    /// alone is a complete configuration.
    pub fn load() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }

        let toml = match config_file_path() {
            Some(path) => match TomlConfig::from_file(&path) {
                Ok(config) => {
                    debug!("Loaded config file {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("{} - continuing with environment only", e);
                    TomlConfig::default()
                }
            },
            None => TomlConfig::default(),
        };

        Self { toml }
    }

    /// Build from an explicit TOML config (environment still takes priority)
    pub fn from_toml(toml: TomlConfig) -> Self {
        Self { toml }
    }

    /// Resolve a setting; empty or whitespace-only values count as unset
    pub fn get(&self, key: ConfigKey) -> Option<String> {
        if let Ok(value) = std::env::var(key.env_var()) {
            if is_set(&value) {
                return Some(value);
            }
        }

        if let Some(value) = self.toml.value(key) {
            if is_set(&value) {
                return Some(value);
            }
        }

        key.compiled_default().map(str::to_string)
    }

    /// Resolve a setting that has to be present
    pub fn require(&self, key: ConfigKey) -> Result<String> {
        self.get(key).ok_or_else(|| {
            Error::Config(format!(
                "{} is not configured (set the environment variable or `{}` in config.toml)",
                key.env_var(),
                key.env_var().to_ascii_lowercase()
            ))
        })
    }

    /// Portal login credentials
    pub fn portal_credentials(&self) -> Result<Credentials> {
        Ok(Credentials {
            identifier: self.require(ConfigKey::AgriNoteId)?,
            secret: self.require(ConfigKey::AgriNotePass)?,
        })
    }

    /// Transient working directory
    pub fn tmp_dir(&self) -> PathBuf {
        self.get(ConfigKey::TmpDir)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TMP_DIR))
    }
}

/// Portal login pair; the secret never appears in `Debug` output
#[derive(Clone)]
pub struct Credentials {
    pub identifier: String,
    pub secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}

fn is_set(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Locate the config file for this platform
///
/// Linux tries `~/.config/agrisync/config.toml` then `/etc/agrisync/config.toml`;
/// other platforms use the user config directory only.
fn config_file_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("agrisync").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/agrisync/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}
