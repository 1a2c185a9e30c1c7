//! User settings read from `pictor.toml`.
//!
//! The file lives in the XDG config directory and is optional; any missing
//! key falls back to its default.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use tracing::{debug, warn};

const CONFIG_FILE: &str = "pictor.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Upscale images smaller than the window.
    pub overzoom: bool,
    /// Shuffle the file list and reshuffle on every lap.
    pub shuffle: bool,
    /// Walk directories given on the command line recursively.
    pub recursive: bool,
    pub autoplay_animations: bool,
    pub show_hidden: bool,
    /// A single file argument opens its whole directory.
    pub expand_single: bool,
    pub copy_to_primary: bool,
    /// `/` searches match case exactly.
    pub search_case_sensitive: bool,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            overzoom: false,
            shuffle: false,
            recursive: false,
            autoplay_animations: true,
            show_hidden: false,
            expand_single: true,
            copy_to_primary: false,
            search_case_sensitive: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ZoomSettings {
    /// Relative change applied by zoom in/out.
    pub step: f64,
    /// Smallest displayed size (px) reachable by stepping.
    pub min_step_px: f64,
    /// Smallest displayed size (px) reachable by an explicit percent.
    pub min_absolute_px: f64,
    /// Largest displayed size as a multiple of the window size.
    pub max_window_factor: f64,
}

impl Default for ZoomSettings {
    fn default() -> Self {
        Self {
            step: 0.25,
            min_step_px: 50.0,
            min_absolute_px: 5.0,
            max_window_factor: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SlideshowSettings {
    pub delay_secs: f64,
}

impl Default for SlideshowSettings {
    fn default() -> Self {
        Self { delay_secs: 2.0 }
    }
}

impl SlideshowSettings {
    pub fn delay(&self) -> Duration {
        Duration::from_secs_f64(self.delay_secs.max(0.1))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub zoom: ZoomSettings,
    pub slideshow: SlideshowSettings,
}

/// Default location of the settings file, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("org", "pictor", "pictor").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

/// Reads settings from a specific file.
pub fn load_from_path(path: &Path) -> Result<Settings> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let settings = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.display()))?;
    debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

/// Loads settings, falling back to defaults.
///
/// Returns the settings together with a warning when an existing file could
/// not be used.
pub fn load(path: Option<&Path>) -> (Settings, Option<String>) {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) => path,
            None => return (Settings::default(), None),
        },
    };

    if !path.exists() {
        debug!("No config at {}, using defaults", path.display());
        return (Settings::default(), None);
    }

    match load_from_path(&path) {
        Ok(settings) => (settings, None),
        Err(err) => {
            warn!(error = ?err, "Falling back to default settings");
            (Settings::default(), Some(format!("{:#}", err)))
        }
    }
}
