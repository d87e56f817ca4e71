use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::conveyor::WindowDefaults;
use crate::pagination::SEGMENT_CAPACITY;

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "folio";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_font_size")]
    pub font_size: f32,

    #[serde(default)]
    pub smooth_paging: bool,

    #[serde(default)]
    pub diagnostics: bool,

    /// Never more than the segment capacity of a window
    #[serde(default = "default_chapters_per_window")]
    pub chapters_per_window: usize,

    #[serde(default = "default_viewport_width")]
    pub viewport_width: f32,

    #[serde(default = "default_viewport_height")]
    pub viewport_height: f32,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_font_size() -> f32 {
    16.0
}

fn default_chapters_per_window() -> usize {
    3
}

fn default_viewport_width() -> f32 {
    320.0
}

fn default_viewport_height() -> f32 {
    480.0
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            font_size: default_font_size(),
            smooth_paging: false,
            diagnostics: false,
            chapters_per_window: default_chapters_per_window(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
        }
    }
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
    }

    /// Read settings from `path`, writing defaults there when the file is missing
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Settings file not found, creating with defaults at {path:?}");
            let settings = Self::default();
            settings.save(path)?;
            return Ok(settings);
        }

        let content =
            fs::read_to_string(path).with_context(|| format!("reading settings {path:?}"))?;
        let mut settings: Settings = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing settings {path:?}"))?;
        debug!("Loaded settings from {path:?}");

        if settings.version < CURRENT_VERSION {
            settings.migrate();
            settings.save(path)?;
        }
        settings.sanitize();
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating config directory {parent:?}"))?;
            }
        }
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content).with_context(|| format!("writing settings {path:?}"))?;
        debug!("Saved settings to {path:?}");
        Ok(())
    }

    fn migrate(&mut self) {
        info!(
            "Migrating settings from v{} to v{}",
            self.version, CURRENT_VERSION
        );
        self.version = CURRENT_VERSION;
    }

    fn sanitize(&mut self) {
        if self.chapters_per_window == 0 || self.chapters_per_window > SEGMENT_CAPACITY {
            let clamped = self.chapters_per_window.clamp(1, SEGMENT_CAPACITY);
            warn!(
                "chapters_per_window {} out of range, using {clamped}",
                self.chapters_per_window
            );
            self.chapters_per_window = clamped;
        }
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            warn!("font_size {} invalid, using default", self.font_size);
            self.font_size = default_font_size();
        }
    }

    pub fn window_defaults(&self) -> WindowDefaults {
        WindowDefaults {
            diagnostics: self.diagnostics,
            font_size: Some(self.font_size),
            smooth_paging: self.smooth_paging,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let settings = Settings::load_or_create(&path).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(path.exists());
    }

    #[test]
    fn partial_file_fills_defaults_and_clamps() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "version: 1\nfont_size: 20\nchapters_per_window: 9\n").unwrap();

        let settings = Settings::load_or_create(&path).unwrap();
        assert_eq!(settings.font_size, 20.0);
        assert_eq!(settings.chapters_per_window, SEGMENT_CAPACITY);
        assert_eq!(settings.viewport_width, 320.0);
    }

    #[test]
    fn old_version_is_migrated_and_rewritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "version: 0\nsmooth_paging: true\n").unwrap();

        let settings = Settings::load_or_create(&path).unwrap();
        assert_eq!(settings.version, CURRENT_VERSION);
        assert!(settings.smooth_paging);

        let rewritten = fs::read_to_string(&path).unwrap();
        assert!(rewritten.contains(&format!("version: {CURRENT_VERSION}")));
    }

    #[test]
    fn garbage_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "font_size: [not, a, number]\n").unwrap();
        assert!(Settings::load_or_create(&path).is_err());
    }
}
