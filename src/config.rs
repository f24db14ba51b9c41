//! Application Configuration
//!
//! Model, segmentation, output and archive settings stored in TOML format.
//! Every field has a default, so a partial file (or none at all) is valid.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Classifier settings
    pub model: ModelConfig,
    /// Glyph segmentation settings
    pub segmentation: SegmentationConfig,
    /// Where artifacts are written
    pub output: OutputConfig,
    /// Where uploads are archived
    pub archive: ArchiveConfig,
}

/// Classifier settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// PyTorch checkpoint holding `state_dict` and `optimizer`
    pub checkpoint: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            checkpoint: PathBuf::from("models/model1.pt"),
        }
    }
}

/// Glyph segmentation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Gaussian sigma (1.1 is what OpenCV derives for a 5x5 kernel)
    pub blur_sigma: f32,
    /// Pixels at or below this intensity count as ink
    pub threshold: u8,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            blur_sigma: 1.1,
            threshold: 90,
        }
    }
}

/// Output artifact settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for composites and glyph crops
    pub static_dir: PathBuf,
    /// Dump intermediate segmentation images here (must be empty)
    pub debug_dir: Option<PathBuf>,
    /// TrueType font for composite labels; system fonts are tried otherwise
    pub font_path: Option<PathBuf>,
    /// Report the three best labels per glyph
    pub ranked_predictions: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            static_dir: PathBuf::from("static"),
            debug_dir: None,
            font_path: None,
            ranked_predictions: false,
        }
    }
}

/// Object store backend for archived uploads
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum ArchiveConfig {
    #[default]
    Disabled,
    /// A local directory standing in for a bucket
    Filesystem { directory: PathBuf },
    /// An S3-compatible endpoint accepting plain PUTs
    Http {
        endpoint: String,
        #[serde(default = "default_bucket")]
        bucket: String,
        /// Environment variable holding a bearer token
        #[serde(default = "default_token_env")]
        token_env: String,
    },
}

fn default_bucket() -> String {
    "digitdrawpredict".to_string()
}

fn default_token_env() -> String {
    "DIGITDRAW_ARCHIVE_TOKEN".to_string()
}

impl AppConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }
}
