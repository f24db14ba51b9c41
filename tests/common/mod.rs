mod checkpoint;
mod fixtures;
pub use checkpoint::*;
pub use fixtures::*;

// Re-export commonly used types from digitdraw for tests
pub use digitdraw::archive::{Archiver, FsObjectStore, HttpObjectStore};
pub use digitdraw::models::BLANK_CLASS;
pub use digitdraw::{DigitPredictor, PredictError, PredictOutcome, PredictionReport};
