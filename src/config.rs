use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::app_state::Theme;
use crate::core::search::DEFAULT_THRESHOLD;
use crate::error::{Result, SlateError};

pub const CONFIG_VERSION: u64 = 1;

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join("slate")
}

fn default_notebooks_dir() -> PathBuf {
    dirs::document_dir()
        .map(|d| d.join("Notebooks"))
        .unwrap_or_else(|| default_data_dir().join("notebooks"))
}

fn default_archive_dir() -> PathBuf {
    default_data_dir().join("archive")
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct SlateConfig {
    pub version: u64,
    pub notebooks_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub theme: Theme,
    pub accent_color: String,
    pub language: String,
    pub search_threshold: f64,
    pub debug_logging: bool,
    /// Inline editor shortcuts: typed trigger → replacement.
    pub custom_shortcuts: BTreeMap<String, String>,
}

impl Default for SlateConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            notebooks_dir: default_notebooks_dir(),
            archive_dir: default_archive_dir(),
            theme: Theme::default(),
            accent_color: "#8c4bff".into(),
            language: "en".into(),
            search_threshold: DEFAULT_THRESHOLD,
            debug_logging: false,
            custom_shortcuts: BTreeMap::new(),
        }
    }
}

impl SlateConfig {
    /// `~/.config/slate/config.json` on Linux.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("slate").join("config.json"))
    }

    /// Read the config at `path`. A missing or unreadable file yields the
    /// defaults so the app can always start.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("Ignoring malformed config {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    pub fn load() -> Self {
        Self::default_path()
            .map(|p| Self::load_from(&p))
            .unwrap_or_default()
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Ensure the notebook and archive directories exist.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.notebooks_dir)?;
        std::fs::create_dir_all(&self.archive_dir)?;
        Ok(())
    }

    /// Register a shortcut. Existing triggers are never overwritten.
    pub fn add_shortcut(&mut self, trigger: &str, value: &str) -> Result<()> {
        let trigger = trigger.trim();
        if trigger.is_empty() || value.is_empty() {
            return Err(SlateError::Config("shortcut and value are both required".into()));
        }
        if self.custom_shortcuts.contains_key(trigger) {
            return Err(SlateError::Config(format!("shortcut {trigger:?} already exists")));
        }
        self.custom_shortcuts.insert(trigger.to_string(), value.to_string());
        Ok(())
    }

    pub fn remove_shortcut(&mut self, trigger: &str) -> bool {
        self.custom_shortcuts.remove(trigger).is_some()
    }
}
