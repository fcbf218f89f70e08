//! Editor configuration.
//!
//! Everything tunable about a sketch session lives here and round-trips
//! through JSON, so the studio can ship presets next to its templates.

use std::fs;
use std::path::Path;

use anyhow::Context;
use egui::Color32;
use serde::{Deserialize, Serialize};
use stencil_core::color;
use thiserror::Error;

/// Bitmap dimensions and the colour it is cleared to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceConfig {
    pub width: u32,
    pub height: u32,
    #[serde(with = "color::hex")]
    pub background: Color32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 600,
            height: 600,
            background: Color32::WHITE,
        }
    }
}

/// Display zoom bounds. Zoom never touches the bitmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoomConfig {
    pub min: f32,
    pub max: f32,
    pub step: f32,
    pub initial: f32,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min: 0.5,
            max: 3.0,
            step: 0.25,
            initial: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrushConfig {
    #[serde(with = "color::hex")]
    pub color: Color32,
    pub size: u32,
    pub eraser_size: u32,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            color: Color32::BLACK,
            size: 5,
            eraser_size: 20,
        }
    }
}

/// How exported files are named.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSettings {
    pub file_prefix: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            file_prefix: "tattoo-design".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    #[serde(default)]
    pub surface: SurfaceConfig,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Largest share of either surface dimension a center-fit image may take.
    #[serde(default = "default_fit_ratio")]
    pub fit_ratio: f32,
    #[serde(default)]
    pub zoom: ZoomConfig,
    #[serde(default)]
    pub brush: BrushConfig,
    #[serde(default)]
    pub export: ExportSettings,
}

fn default_history_limit() -> usize {
    20
}

fn default_fit_ratio() -> f32 {
    0.8
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            surface: SurfaceConfig::default(),
            history_limit: default_history_limit(),
            fit_ratio: default_fit_ratio(),
            zoom: ZoomConfig::default(),
            brush: BrushConfig::default(),
            export: ExportSettings::default(),
        }
    }
}

impl EditorConfig {
    /// Square surface preset used for flash sheets.
    pub fn flash_sheet() -> Self {
        Self {
            surface: SurfaceConfig {
                width: 1024,
                height: 1024,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.surface.width == 0 || self.surface.height == 0 {
            tracing::error!(
                width = self.surface.width,
                height = self.surface.height,
                "surface dimensions must be non-zero"
            );
            return Err(ConfigError::EmptySurface {
                width: self.surface.width,
                height: self.surface.height,
            });
        }

        if self.history_limit == 0 {
            tracing::error!("history limit must be at least one");
            return Err(ConfigError::InvalidHistoryLimit);
        }

        if !(self.fit_ratio > 0.0 && self.fit_ratio <= 1.0) {
            tracing::error!(fit_ratio = self.fit_ratio, "fit ratio must be in (0, 1]");
            return Err(ConfigError::InvalidFitRatio(self.fit_ratio));
        }

        let zoom = &self.zoom;
        if !(zoom.min > 0.0 && zoom.min <= zoom.max && zoom.step > 0.0) {
            tracing::error!(
                min = zoom.min,
                max = zoom.max,
                step = zoom.step,
                "invalid zoom range"
            );
            return Err(ConfigError::InvalidZoom {
                reason: format!("min={} max={} step={}", zoom.min, zoom.max, zoom.step),
            });
        }
        if !(zoom.min..=zoom.max).contains(&zoom.initial) {
            return Err(ConfigError::InvalidZoom {
                reason: format!("initial zoom {} outside [{}, {}]", zoom.initial, zoom.min, zoom.max),
            });
        }

        if self.brush.size == 0 || self.brush.eraser_size == 0 {
            return Err(ConfigError::InvalidBrushSize);
        }

        let invalid_chars = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];
        if self.export.file_prefix.is_empty()
            || self.export.file_prefix.contains(invalid_chars.as_slice())
        {
            tracing::error!(prefix = %self.export.file_prefix, "invalid export file prefix");
            return Err(ConfigError::InvalidFilePrefix(self.export.file_prefix.clone()));
        }

        Ok(())
    }

    /// Load and validate a config from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("read editor config: {}", path.display()))?;
        let config: EditorConfig =
            serde_json::from_str(&data).context("parse editor config json")?;
        config.validate().context("validate editor config")?;
        Ok(config)
    }

    /// Save as pretty JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create parent dir: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialize editor config")?;
        fs::write(path, json).with_context(|| format!("write editor config: {}", path.display()))?;
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("surface must be non-empty, got {width}x{height}")]
    EmptySurface { width: u32, height: u32 },

    #[error("history limit must be at least one")]
    InvalidHistoryLimit,

    #[error("fit ratio {0} must be in (0, 1]")]
    InvalidFitRatio(f32),

    #[error("invalid zoom configuration: {reason}")]
    InvalidZoom { reason: String },

    #[error("brush and eraser sizes must be positive")]
    InvalidBrushSize,

    #[error("invalid export file prefix: {0:?}")]
    InvalidFilePrefix(String),
}
