pub mod contours;
pub mod normalize;
pub mod preprocessing;
pub mod steps;

use crate::config::SegmentationConfig;
use crate::models::GlyphRegion;
use crate::pipeline::Pipeline;
use anyhow::Result;
use image::DynamicImage;
use std::path::PathBuf;
use std::sync::Arc;
use steps::{BlurStep, ContourDetectionStep, GrayscaleStep, ThresholdStep};
use tracing::debug;

/// Result of glyph segmentation, split by how many regions were found.
///
/// The single-region case is kept apart because its crop comes from the
/// canvas's own non-white extent instead of the detected rectangle (see
/// [`normalize::crop_single`]). That asymmetry with the multi-region path is
/// preserved as found; it reads like an accuracy workaround.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segmentation {
    /// Blank canvas
    Empty,
    Single(GlyphRegion),
    Multiple(Vec<GlyphRegion>),
}

impl Segmentation {
    pub fn from_regions(mut regions: Vec<GlyphRegion>) -> Self {
        match regions.len() {
            0 => Segmentation::Empty,
            1 => Segmentation::Single(regions.remove(0)),
            _ => Segmentation::Multiple(regions),
        }
    }

    /// Regions in detection order
    pub fn regions(&self) -> &[GlyphRegion] {
        match self {
            Segmentation::Empty => &[],
            Segmentation::Single(region) => std::slice::from_ref(region),
            Segmentation::Multiple(regions) => regions,
        }
    }

    pub fn len(&self) -> usize {
        self.regions().len()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Segmentation::Empty)
    }
}

/// Locates connected ink blobs on a canvas
pub struct GlyphSegmenter {
    pipeline: Pipeline,
}

impl GlyphSegmenter {
    pub fn new(config: &SegmentationConfig) -> Self {
        Self {
            pipeline: build_segmentation_pipeline(config),
        }
    }

    /// Dump intermediate step images under `dir`
    pub fn with_debug(mut self, dir: PathBuf) -> Result<Self> {
        self.pipeline = self.pipeline.with_debug(dir)?;
        Ok(self)
    }

    pub fn segment(&self, img: &DynamicImage) -> Result<Segmentation> {
        let items = self.pipeline.run(img.clone())?;
        let regions: Vec<GlyphRegion> = items.iter().filter_map(|item| item.region).collect();
        debug!(regions = regions.len(), "segmentation finished");
        Ok(Segmentation::from_regions(regions))
    }
}

impl Default for GlyphSegmenter {
    fn default() -> Self {
        Self::new(&SegmentationConfig::default())
    }
}

/// Grayscale → blur → inverted threshold → external contours
pub fn build_segmentation_pipeline(config: &SegmentationConfig) -> Pipeline {
    Pipeline::new()
        .add_step(Arc::new(GrayscaleStep))
        .add_step(Arc::new(BlurStep {
            sigma: config.blur_sigma,
        }))
        .add_step(Arc::new(ThresholdStep {
            threshold: config.threshold,
        }))
        .add_step(Arc::new(ContourDetectionStep))
}
