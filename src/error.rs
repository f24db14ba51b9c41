//! Error types for every stage of a prediction.

use crate::models::GlyphRegion;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while turning upload bytes into an image
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image data is empty")]
    EmptyData,

    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Invalid base64 encoding: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Malformed data URL")]
    MalformedDataUrl,

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),
}

/// Failures while loading or running the classifier
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Checkpoint not found: {}", .0.display())]
    CheckpointMissing(PathBuf),

    #[error("Failed to load checkpoint {}: {reason}", path.display())]
    CheckpointLoad { path: PathBuf, reason: String },

    #[error("Checkpoint parameter {name} has shape {actual:?}, expected {expected:?}")]
    IncompatibleShape {
        name: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Network produced {0} scores, expected 11")]
    UnexpectedOutput(usize),

    #[error("Tensor conversion failed: {0}")]
    Tensor(String),
}

/// Failures while writing glyph crops or the annotated composite
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode image: {0}")]
    Encode(#[from] image::ImageError),

    #[error("{regions} regions but {labels} labels")]
    Mismatch { regions: usize, labels: usize },
}

/// Failures while writing an upload to the object store
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Object store rejected {key}: HTTP {status}")]
    Rejected { key: String, status: u16 },
}

/// Failures while reading the TOML configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Everything `DigitPredictor::predict` can fail with
#[derive(Debug, Error)]
pub enum PredictError {
    #[error(transparent)]
    Decode(#[from] ImageError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Region {region:?} lies outside the {width}x{height} canvas")]
    RegionOutsideCanvas {
        region: GlyphRegion,
        width: u32,
        height: u32,
    },

    #[error("Segmentation failed: {0}")]
    Segmentation(#[from] anyhow::Error),
}
