use ndarray::Array3;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Number of classifier outputs: digits 0-9 plus the blank class
pub const NUM_CLASSES: usize = 11;

/// Class index meaning "no confident digit"
pub const BLANK_CLASS: usize = 10;

/// Side length of the square glyph fed to the network
pub const GLYPH_SIZE: usize = 32;

/// Bounding box of one connected ink blob in the source image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GlyphRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl GlyphRegion {
    /// Build a region from inclusive pixel extents
    pub fn from_extents(min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> Self {
        Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        }
    }

    /// Exclusive right edge
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Clamp to an image of the given size; `None` if nothing is left
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Self> {
        if self.x >= width || self.y >= height {
            return None;
        }
        let w = self.width.min(width - self.x);
        let h = self.height.min(height - self.y);
        if w == 0 || h == 0 {
            return None;
        }
        Some(Self {
            x: self.x,
            y: self.y,
            width: w,
            height: h,
        })
    }
}

/// Normalized CHW input for the classifier, shape (3, 32, 32), values in [-1, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphTensor(pub Array3<f32>);

impl GlyphTensor {
    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }

    /// Values in row-major (C, H, W) order
    pub fn to_vec(&self) -> Vec<f32> {
        self.0.iter().copied().collect()
    }
}

/// Raw logits for the eleven classes of one glyph
#[derive(Debug, Clone, PartialEq)]
pub struct ClassScores(pub [f32; NUM_CLASSES]);

impl ClassScores {
    /// Index of the highest score; ties resolve to the lowest index
    pub fn top1(&self) -> usize {
        let mut best = 0;
        for (idx, score) in self.0.iter().enumerate().skip(1) {
            if *score > self.0[best] {
                best = idx;
            }
        }
        best
    }

    /// The three highest-scoring indices, best first; ties keep the lower index first
    pub fn top3(&self) -> [usize; 3] {
        let mut order: Vec<usize> = (0..NUM_CLASSES).collect();
        // Stable sort keeps lower indices ahead on equal scores
        order.sort_by(|a, b| self.0[*b].total_cmp(&self.0[*a]));
        [order[0], order[1], order[2]]
    }
}

/// Labels derived from one glyph's scores
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphPrediction {
    pub label: &'static str,
    pub ranked: Option<[&'static str; 3]>,
}

/// Structured result handed back to the caller for a non-empty canvas
#[derive(Debug, Clone, Serialize)]
pub struct PredictionReport {
    /// Top-1 labels joined by single spaces, `-` for no digit
    pub prediction: String,
    /// Annotated composite image
    pub composite: PathBuf,
    /// Cumulative glyph count across all requests
    pub counter: usize,
    /// One cropped glyph image per region, in region order
    pub glyph_images: Vec<PathBuf>,
    /// Top-3 labels per glyph, when enabled
    pub ranked: Option<Vec<[String; 3]>>,
    /// Object store key of the archived upload, if archival succeeded
    pub archive_key: Option<String>,
    pub regions: Vec<GlyphRegion>,
}

/// Outcome of a prediction request
#[derive(Debug, Clone)]
pub enum PredictOutcome {
    /// No glyphs were found on the canvas
    NothingDrawn,
    Predicted(PredictionReport),
}

impl PredictOutcome {
    pub fn report(&self) -> Option<&PredictionReport> {
        match self {
            PredictOutcome::NothingDrawn => None,
            PredictOutcome::Predicted(report) => Some(report),
        }
    }
}

impl fmt::Display for PredictOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictOutcome::NothingDrawn => f.write_str("Can't predict, when nothing is drawn"),
            PredictOutcome::Predicted(report) => f.write_str(&report.prediction),
        }
    }
}
