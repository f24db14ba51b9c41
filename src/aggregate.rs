//! From raw scores to labels, plus the cumulative glyph counter.

use crate::models::{BLANK_CLASS, ClassScores, GlyphPrediction};
use std::sync::atomic::{AtomicUsize, Ordering};

const DIGIT_LABELS: [&str; 10] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];

/// Label shown for a class index: digits for 0-9, "-" for the blank class.
///
/// Indices come from argmax over [`ClassScores`], so nothing above
/// [`BLANK_CLASS`] ever reaches this.
pub fn label_for_class(index: usize) -> &'static str {
    match index {
        BLANK_CLASS => "-",
        digit => DIGIT_LABELS[digit],
    }
}

/// Top-1 label, and the ranked top-3 when requested
pub fn predict_glyph(scores: &ClassScores, ranked: bool) -> GlyphPrediction {
    GlyphPrediction {
        label: label_for_class(scores.top1()),
        ranked: ranked.then(|| scores.top3().map(label_for_class)),
    }
}

/// Top-1 labels joined by single spaces, in glyph order
pub fn headline(predictions: &[GlyphPrediction]) -> String {
    predictions
        .iter()
        .map(|p| p.label)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Process-lifetime count of classified glyphs, for display only
#[derive(Debug, Default)]
pub struct RequestCounter(AtomicUsize);

impl RequestCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a request's glyph count and return the new total
    pub fn record(&self, glyphs: usize) -> usize {
        self.0.fetch_add(glyphs, Ordering::SeqCst) + glyphs
    }

    pub fn total(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}
