//! Configuration management
//!
//! settings.json in the data directory:
//! ```json
//! {
//!   "defaultFeed": "titulos-vencidos",
//!   "parser": { "maxTitleValue": 10000000, "maxBlockLines": 200 }
//! }
//! ```
//! Keys this crate does not manage are preserved on save.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::result::Error;
use crate::extraction::ParserSettings;

/// Feed used when neither settings nor environment name one
pub const DEFAULT_FEED: &str = "default";

/// Environment override for the default feed (CI, scripts)
pub const FEED_ENV_VAR: &str = "DUEWATCH_FEED";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_feed: Option<String>,
    #[serde(default)]
    parser: ParserSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Duewatch configuration (resolved view of settings)
#[derive(Debug, Clone)]
pub struct Config {
    pub default_feed: String,
    pub parser: ParserSettings,
    // Keep the raw settings for preservation when saving
    _raw_settings: SettingsFile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_feed: DEFAULT_FEED.to_string(),
            parser: ParserSettings::default(),
            _raw_settings: SettingsFile::default(),
        }
    }
}

impl Config {
    /// Load config from the data directory
    ///
    /// A missing file means defaults. `DUEWATCH_FEED` wins over `defaultFeed`.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let raw = read_settings(data_dir)?;

        let default_feed = std::env::var(FEED_ENV_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| raw.default_feed.clone())
            .unwrap_or_else(|| DEFAULT_FEED.to_string());

        Ok(Self {
            default_feed,
            parser: raw.parser.clone(),
            _raw_settings: raw,
        })
    }

    /// Save config to the data directory
    ///
    /// Re-reads the file first so keys written by other tools survive.
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let mut settings = read_settings(data_dir).unwrap_or_else(|_| self._raw_settings.clone());

        settings.default_feed = Some(self.default_feed.clone());
        settings.parser = self.parser.clone();

        std::fs::create_dir_all(data_dir)?;
        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(data_dir.join("settings.json"), content)?;
        Ok(())
    }

    /// Feed to use: an explicit one if given, the configured default otherwise
    pub fn resolve_feed(&self, explicit: Option<&str>) -> String {
        explicit
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.default_feed.clone())
    }
}

fn read_settings(data_dir: &Path) -> Result<SettingsFile> {
    let settings_path = data_dir.join("settings.json");
    if !settings_path.exists() {
        return Ok(SettingsFile::default());
    }

    let content = std::fs::read_to_string(&settings_path)?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Invalid {}: {}", settings_path.display(), e)).into()
    })
}
