//! Tool configuration
//!
//! Loaded from YAML. Every field has a default, so an empty file (or no file
//! at all) gives the standard TS2 behaviour.

use inspect_report::{
    CompressOptions, ExportMode, ExportOptions, PageFormat, ScoreCalculator, ScoringPolicy,
    DEFAULT_REPORT_PREFIX, MAX_RASTER_SCALE,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// PDF export settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Raster scale
    pub scale: f32,
    /// Paper size
    pub page_format: PageFormat,
    /// Raster or direct drawing
    pub mode: ExportMode,
    /// Per-image load timeout in milliseconds
    pub image_timeout_ms: u64,
    /// JPEG quality of page images (0.0-1.0)
    pub jpeg_quality: f32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            scale: 1.5,
            page_format: PageFormat::A4,
            mode: ExportMode::Raster,
            image_timeout_ms: 10_000,
            jpeg_quality: 0.95,
        }
    }
}

/// Post-export compression settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressConfig {
    /// Compress after export
    pub enabled: bool,
    /// JPEG quality of re-encoded images (0.0-1.0)
    pub image_quality: f32,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            image_quality: 0.85,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectConfig {
    /// Scoring thresholds
    pub scoring: ScoringPolicy,
    /// Export settings
    pub export: ExportConfig,
    /// Compression settings
    pub compress: CompressConfig,
    /// Artifact file name prefix
    pub report_prefix: String,
    /// Directory holding the form page images
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets_dir: Option<PathBuf>,
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringPolicy::default(),
            export: ExportConfig::default(),
            compress: CompressConfig::default(),
            report_prefix: DEFAULT_REPORT_PREFIX.to_string(),
            assets_dir: None,
        }
    }
}

fn in_unit_range(value: f32) -> bool {
    value.is_finite() && value > 0.0 && value <= 1.0
}

impl InspectConfig {
    /// Load and validate a YAML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(Error::from)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        self.scoring
            .validate()
            .map_err(|e| Error::Config(e.to_string()))?;
        if !self.export.scale.is_finite()
            || self.export.scale <= 0.0
            || self.export.scale > MAX_RASTER_SCALE
        {
            return Err(Error::Config(format!(
                "export.scale must be in (0, {MAX_RASTER_SCALE}], got {}",
                self.export.scale
            )));
        }
        if !in_unit_range(self.export.jpeg_quality) {
            return Err(Error::Config(format!(
                "export.jpeg_quality must be in (0, 1], got {}",
                self.export.jpeg_quality
            )));
        }
        if self.export.image_timeout_ms == 0 {
            return Err(Error::Config(
                "export.image_timeout_ms must be positive".to_string(),
            ));
        }
        if !in_unit_range(self.compress.image_quality) {
            return Err(Error::Config(format!(
                "compress.image_quality must be in (0, 1], got {}",
                self.compress.image_quality
            )));
        }
        if self.report_prefix.trim().is_empty() {
            return Err(Error::Config("report_prefix must not be empty".to_string()));
        }
        Ok(())
    }

    /// Exporter settings
    #[must_use]
    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            scale: self.export.scale,
            page_format: self.export.page_format,
            mode: self.export.mode,
            jpeg_quality: self.export.jpeg_quality,
            image_timeout: Duration::from_millis(self.export.image_timeout_ms),
        }
    }

    /// Compressor settings
    #[must_use]
    pub fn compress_options(&self) -> CompressOptions {
        CompressOptions {
            image_quality: self.compress.image_quality,
        }
    }

    /// Score calculator using the configured thresholds
    #[must_use]
    pub fn calculator(&self) -> ScoreCalculator {
        ScoreCalculator::new().with_policy(self.scoring)
    }
}
