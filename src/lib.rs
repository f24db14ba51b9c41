pub mod aggregate;
pub mod archive;
pub mod classifier;
pub mod config;
pub mod detection;
pub mod error;
pub mod image_io;
pub mod models;
pub mod pipeline;
pub mod predictor;
pub mod render;

pub use classifier::{CnnClassifier, GlyphClassifier, InferenceBackend};
pub use config::AppConfig;
pub use detection::{GlyphSegmenter, Segmentation};
pub use error::{ImageError, ModelError, PredictError};
pub use models::{
    ClassScores, GlyphPrediction, GlyphRegion, GlyphTensor, PredictOutcome, PredictionReport,
};
pub use pipeline::{Pipeline, PipelineContext, PipelineData, PipelineStep};
pub use predictor::DigitPredictor;
