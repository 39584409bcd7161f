//! Editor settings, persisted as JSON in the user's config directory.

use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path, path::PathBuf};

use crate::error::ConfigError;

pub const SETTINGS_DIR_NAME: &str = "RegionBlur";
pub const SETTINGS_FILE_NAME: &str = "settings.json";

pub const DEFAULT_MAX_FILE_BYTES: u64 = 100 * 1024 * 1024;
pub const DEFAULT_MAX_DIMENSION: u32 = 20_000;
pub const DEFAULT_BLUR_RADIUS: f32 = 10.0;
pub const DEFAULT_MIN_SELECTION_SIZE: f32 = 10.0;
pub const DEFAULT_EXPORT_PREFIX: &str = "blurred-image";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EditorConfig {
    /// Largest accepted input file, in bytes
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    /// Largest accepted width or height, in pixels
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
    /// Gaussian sigma in bitmap pixels
    #[serde(default = "default_blur_radius")]
    pub blur_radius: f32,
    /// Selections must be strictly larger than this on both sides
    #[serde(default = "default_min_selection_size")]
    pub min_selection_size: f32,
    #[serde(default = "default_export_prefix")]
    pub export_prefix: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
            max_dimension: default_max_dimension(),
            blur_radius: default_blur_radius(),
            min_selection_size: default_min_selection_size(),
            export_prefix: default_export_prefix(),
        }
    }
}

impl EditorConfig {
    /// Replaces values that would make the editor unusable with defaults.
    pub fn repaired(mut self) -> Self {
        if self.max_file_bytes == 0 {
            self.max_file_bytes = default_max_file_bytes();
        }
        if self.max_dimension == 0 {
            self.max_dimension = default_max_dimension();
        }
        if !(self.blur_radius > 0.0) {
            self.blur_radius = default_blur_radius();
        }
        if !(self.min_selection_size >= 0.0) {
            self.min_selection_size = default_min_selection_size();
        }
        if self.export_prefix.trim().is_empty() {
            self.export_prefix = default_export_prefix();
        }
        self
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let bytes = fs::read(path)?;
        let config: Self = serde_json::from_slice(&bytes)?;
        Ok(config.repaired())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}

/// Loads the user's settings from [`settings_path`].
pub fn load_settings() -> EditorConfig {
    load_settings_from(&settings_path())
}

/// Loads settings from `path`, falling back to defaults on any error.
///
/// Defaults are written back only when the file does not exist yet. A file
/// that exists but fails to read or parse is left alone for the user to fix.
pub fn load_settings_from(path: &Path) -> EditorConfig {
    match EditorConfig::from_file(path) {
        Ok(config) => config,
        Err(ConfigError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
            log::info!("No settings at {}, writing defaults", path.display());
            let config = EditorConfig::default();
            if let Err(err) = config.save_to(path) {
                log::warn!("Failed to write default settings: {}", err);
            }
            config
        }
        Err(err) => {
            log::warn!("Using default settings ({}): {}", path.display(), err);
            EditorConfig::default()
        }
    }
}

pub fn settings_path() -> PathBuf {
    let mut base = dirs::config_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    base.push(SETTINGS_DIR_NAME);
    base.push(SETTINGS_FILE_NAME);
    base
}

fn default_max_file_bytes() -> u64 {
    DEFAULT_MAX_FILE_BYTES
}

fn default_max_dimension() -> u32 {
    DEFAULT_MAX_DIMENSION
}

fn default_blur_radius() -> f32 {
    DEFAULT_BLUR_RADIUS
}

fn default_min_selection_size() -> f32 {
    DEFAULT_MIN_SELECTION_SIZE
}

fn default_export_prefix() -> String {
    DEFAULT_EXPORT_PREFIX.to_string()
}
