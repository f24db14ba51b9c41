use crate::aggregate::{self, RequestCounter};
use crate::archive::Archiver;
use crate::classifier::{CnnClassifier, GlyphClassifier, InferenceBackend};
use crate::config::AppConfig;
use crate::detection::{GlyphSegmenter, Segmentation, normalize};
use crate::error::PredictError;
use crate::image_io;
use crate::models::{GlyphRegion, PredictOutcome, PredictionReport};
use crate::render::CompositeRenderer;
use anyhow::Context;
use image::RgbImage;
use tracing::{debug, info};

/// End-to-end recognizer: canvas bytes in, labelled glyphs out.
///
/// Safe to share between request handlers: the network is only read and the
/// glyph counter is atomic.
pub struct DigitPredictor {
    segmenter: GlyphSegmenter,
    classifier: Box<dyn GlyphClassifier>,
    renderer: CompositeRenderer,
    archiver: Archiver,
    counter: RequestCounter,
    ranked: bool,
}

impl DigitPredictor {
    pub fn new(classifier: Box<dyn GlyphClassifier>, renderer: CompositeRenderer) -> Self {
        Self {
            segmenter: GlyphSegmenter::default(),
            classifier,
            renderer,
            archiver: Archiver::disabled(),
            counter: RequestCounter::new(),
            ranked: false,
        }
    }

    /// Load the checkpoint and wire every stage from configuration.
    /// A missing or incompatible checkpoint is an error here, before any
    /// request is served.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let classifier = CnnClassifier::<InferenceBackend>::load(&config.model.checkpoint)?;

        let mut segmenter = GlyphSegmenter::new(&config.segmentation);
        if let Some(debug_dir) = &config.output.debug_dir {
            segmenter = segmenter.with_debug(debug_dir.clone())?;
        }

        let renderer = CompositeRenderer::new(
            config.output.static_dir.clone(),
            config.output.font_path.as_deref(),
        );
        let archiver =
            Archiver::from_config(&config.archive).context("Failed to set up archive store")?;

        Ok(Self::new(Box::new(classifier), renderer)
            .with_segmenter(segmenter)
            .with_archiver(archiver)
            .with_ranked_predictions(config.output.ranked_predictions))
    }

    pub fn with_segmenter(mut self, segmenter: GlyphSegmenter) -> Self {
        self.segmenter = segmenter;
        self
    }

    pub fn with_archiver(mut self, archiver: Archiver) -> Self {
        self.archiver = archiver;
        self
    }

    /// Also report the three best labels per glyph
    pub fn with_ranked_predictions(mut self, ranked: bool) -> Self {
        self.ranked = ranked;
        self
    }

    /// Glyphs classified so far across all requests
    pub fn counter(&self) -> usize {
        self.counter.total()
    }

    /// Same as [`predict`](Self::predict) for a base64 `data:` URL
    pub fn predict_data_url(&self, data_url: &str) -> Result<PredictOutcome, PredictError> {
        let bytes = image_io::decode_data_url(data_url)?;
        self.predict(&bytes)
    }

    pub fn predict(&self, bytes: &[u8]) -> Result<PredictOutcome, PredictError> {
        let image = image_io::decode_image_bytes(bytes)?;
        let segmentation = self.segmenter.segment(&image)?;

        if segmentation.is_empty() {
            info!("nothing drawn");
            return Ok(PredictOutcome::NothingDrawn);
        }
        info!(glyphs = segmentation.len(), "segmented canvas");

        let canvas = image.to_rgb8();
        let mut glyph_images = Vec::with_capacity(segmentation.len());
        let mut predictions = Vec::with_capacity(segmentation.len());

        for (idx, region) in segmentation.regions().iter().enumerate() {
            let crop = crop_glyph(&canvas, &segmentation, region)?;
            glyph_images.push(self.renderer.save_glyph(&crop)?);

            let tensor = normalize::to_glyph_tensor(&crop);
            let scores = self.classifier.classify(&tensor)?;
            let prediction = aggregate::predict_glyph(&scores, self.ranked);
            debug!(glyph = idx, label = prediction.label, "classified glyph");
            predictions.push(prediction);
        }

        let prediction = aggregate::headline(&predictions);
        let labels: Vec<&str> = predictions.iter().map(|p| p.label).collect();
        let composite = self.renderer.render(&image, segmentation.regions(), &labels)?;

        // Only completed requests count
        let counter = self.counter.record(predictions.len());

        let archive_key = self.archiver.archive(bytes, &prediction);

        let ranked = self.ranked.then(|| {
            predictions
                .iter()
                .filter_map(|p| p.ranked)
                .map(|labels| labels.map(str::to_string))
                .collect()
        });

        info!(prediction = %prediction, counter, "prediction complete");

        Ok(PredictOutcome::Predicted(PredictionReport {
            prediction,
            composite: composite.path,
            counter,
            glyph_images,
            ranked,
            archive_key,
            regions: composite.boxes,
        }))
    }
}

/// Crop one glyph from the RGB canvas. A lone glyph is cut from the
/// canvas's whole non-white extent rather than its contour box.
fn crop_glyph(
    canvas: &RgbImage,
    segmentation: &Segmentation,
    region: &GlyphRegion,
) -> Result<RgbImage, PredictError> {
    let crop = match segmentation {
        Segmentation::Single(detected) => normalize::crop_single(canvas, detected),
        _ => normalize::crop_region(canvas, region),
    };

    crop.ok_or(PredictError::RegionOutsideCanvas {
        region: *region,
        width: canvas.width(),
        height: canvas.height(),
    })
}
