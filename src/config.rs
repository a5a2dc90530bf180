//! Theme configuration, persisted in `~/.data_explorer_theme.json`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

const THEME_FILE: &str = ".data_explorer_theme.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid theme file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }

    /// Label for the button that switches to the other mode.
    pub fn toggle_label(self) -> &'static str {
        match self {
            ThemeMode::Light => "🌙 Dark Mode",
            ThemeMode::Dark => "☀ Light Mode",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
struct ThemeFile {
    theme: ThemeMode,
}

/// Path to `~/.data_explorer_theme.json`.
fn default_theme_path() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE")
            .ok()
            .map(|p| PathBuf::from(p).join(THEME_FILE))
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME")
            .ok()
            .map(|p| PathBuf::from(p).join(THEME_FILE))
    }
}

/// The current theme and where it is saved.
#[derive(Debug, Clone)]
pub struct ThemeConfig {
    path: Option<PathBuf>,
    mode: ThemeMode,
}

impl ThemeConfig {
    /// Load from the home directory, falling back to Light.
    pub fn load() -> Self {
        Self::load_from(default_theme_path())
    }

    pub fn load_from(path: Option<PathBuf>) -> Self {
        let mode = match path.as_deref().map(read_theme) {
            Some(Ok(mode)) => mode,
            Some(Err(e)) => {
                warn!("{}; using light theme", e);
                ThemeMode::Light
            }
            None => ThemeMode::Light,
        };
        Self { path, mode }
    }

    pub fn mode(&self) -> ThemeMode {
        self.mode
    }

    /// Switch mode and save immediately. Save failures are only logged.
    pub fn toggle(&mut self) -> ThemeMode {
        self.mode = self.mode.toggled();
        if let Some(path) = &self.path {
            match write_theme(path, self.mode) {
                Ok(()) => info!("Saved theme preference {:?}", self.mode),
                Err(e) => warn!("Could not save theme preference: {}", e),
            }
        }
        self.mode
    }
}

fn read_theme(path: &Path) -> Result<ThemeMode, ConfigError> {
    if !path.exists() {
        return Ok(ThemeMode::Light);
    }
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: ThemeFile = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(file.theme)
}

fn write_theme(path: &Path, mode: ThemeMode) -> Result<(), ConfigError> {
    let text = serde_json::to_string(&ThemeFile { theme: mode }).map_err(|source| {
        ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        }
    })?;
    fs::write(path, text).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
