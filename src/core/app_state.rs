use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::SlateConfig;
use crate::error::{Result, SlateError};

pub const ACCENT_COLORS: [&str; 6] = ["blue", "green", "red", "purple", "orange", "yellow"];

static HEX_COLOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").unwrap()
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    /// Follow the desktop's colour scheme.
    #[default]
    Auto,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::Light, Theme::Dark, Theme::Auto];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::Auto => "auto",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

/// Overlays and panels that can be open at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modal {
    FilesSidebar,
    CommandBar,
    Shortcuts,
    Settings,
    ChalkBoard,
    Calculator,
    Archive,
}

/// UI-wide state. Every change goes through a setter.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    theme: Theme,
    accent_color: String,
    language: String,
    open: HashSet<Modal>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::from_config(&SlateConfig::default())
    }
}

impl AppState {
    pub fn from_config(config: &SlateConfig) -> Self {
        Self {
            theme: config.theme,
            accent_color: config.accent_color.clone(),
            language: config.language.clone(),
            open: HashSet::from([Modal::FilesSidebar]),
        }
    }

    /// Copy the persisted parts back into `config`.
    pub fn write_to(&self, config: &mut SlateConfig) {
        config.theme = self.theme;
        config.accent_color = self.accent_color.clone();
        config.language = self.language.clone();
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn accent_color(&self) -> &str {
        &self.accent_color
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    /// Accepts a palette colour name or a `#rgb` / `#rrggbb` value.
    pub fn set_accent_color(&mut self, color: &str) -> Result<()> {
        if !ACCENT_COLORS.contains(&color) && !HEX_COLOR_RE.is_match(color) {
            return Err(SlateError::Config(format!("unknown accent color {color:?}")));
        }
        self.accent_color = color.to_string();
        Ok(())
    }

    pub fn set_language(&mut self, language: &str) -> Result<()> {
        let language = language.trim();
        if language.is_empty() {
            return Err(SlateError::Config("language code is empty".into()));
        }
        self.language = language.to_string();
        Ok(())
    }

    pub fn is_open(&self, modal: Modal) -> bool {
        self.open.contains(&modal)
    }

    pub fn open(&mut self, modal: Modal) {
        self.open.insert(modal);
    }

    pub fn close(&mut self, modal: Modal) {
        self.open.remove(&modal);
    }

    /// Returns whether `modal` is open afterwards.
    pub fn toggle(&mut self, modal: Modal) -> bool {
        if !self.open.remove(&modal) {
            self.open.insert(modal);
            true
        } else {
            false
        }
    }
}
