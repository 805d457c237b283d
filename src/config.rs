//! Persisted user settings.
//!
//! Stored as pretty JSON under the per-user config directory. Loading
//! merges whatever the file holds over the defaults; a broken file is
//! reported and ignored.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{FillMode, DEFAULT_SUFFIX};
use crate::error::{RemoverError, RemoverResult};

/// Number of recently used files remembered.
pub const MAX_RECENT_FILES: usize = 10;

const APP_DIR: &str = "watermark-remover";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub maximized: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
            x: None,
            y: None,
            maximized: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub dpi: u32,
    pub default_zoom: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dpi: 150,
            default_zoom: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub render: RenderConfig,
    /// Most recent first.
    pub recent_files: Vec<PathBuf>,
    pub region_fill_mode: FillMode,
    pub output_suffix: String,
    /// Last exclusion string as typed.
    pub excluded_pages: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            render: RenderConfig::default(),
            recent_files: Vec::new(),
            region_fill_mode: FillMode::default(),
            output_suffix: DEFAULT_SUFFIX.to_string(),
            excluded_pages: String::new(),
        }
    }
}

impl AppConfig {
    /// `<config dir>/watermark-remover/config.json`, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Loads settings, falling back to defaults when the file is missing
    /// or unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "using default settings");
                Self::default()
            }
        }
    }

    /// Loads settings; a missing file yields defaults.
    pub fn load(path: &Path) -> RemoverResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path).map_err(|e| RemoverError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&raw).map_err(|e| RemoverError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn save(&self, path: &Path) -> RemoverResult<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| RemoverError::Io {
                path: dir.to_path_buf(),
                source: e,
            })?;
        }

        let raw = serde_json::to_string_pretty(self).map_err(|e| RemoverError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        fs::write(path, raw).map_err(|e| RemoverError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Moves the given files to the front of the recent list.
    pub fn remember_files<'a>(&mut self, files: impl IntoIterator<Item = &'a PathBuf>) {
        for file in files {
            self.recent_files.retain(|f| f != file);
            self.recent_files.insert(0, file.clone());
        }
        self.recent_files.truncate(MAX_RECENT_FILES);
    }
}
