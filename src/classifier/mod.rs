pub mod checkpoint;
pub mod model;

use crate::error::ModelError;
use crate::models::{ClassScores, GLYPH_SIZE, GlyphTensor, NUM_CLASSES};
use burn::backend::NdArray;
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use model::{DigitNet, DigitNetConfig};
use std::path::Path;
use std::sync::Mutex;

/// Backend used for serving: no autodiff, so dropout stays inactive
pub type InferenceBackend = NdArray<f32>;

/// Anything that can score a glyph tensor against the eleven classes
pub trait GlyphClassifier: Send + Sync {
    fn classify(&self, glyph: &GlyphTensor) -> Result<ClassScores, ModelError>;
}

/// The convolutional network behind [`GlyphClassifier`]
pub struct CnnClassifier<B: Backend> {
    // Modules are Send but not Sync. The lock is held only to clone the
    // module, which shares its tensors, so inference itself runs in parallel.
    model: Mutex<DigitNet<B>>,
    device: B::Device,
}

impl CnnClassifier<InferenceBackend> {
    /// Load trained weights on the CPU backend
    pub fn load(checkpoint: &Path) -> Result<Self, ModelError> {
        let device = Default::default();
        let model = checkpoint::load_digit_net::<InferenceBackend>(checkpoint, &device)?;
        Ok(Self::from_model(model, device))
    }
}

impl<B: Backend> CnnClassifier<B> {
    pub fn from_model(model: DigitNet<B>, device: B::Device) -> Self {
        Self {
            model: Mutex::new(model),
            device,
        }
    }

    /// Untrained network, for wiring tests
    pub fn untrained(device: B::Device) -> Self {
        let model = DigitNetConfig::new().init::<B>(&device);
        Self::from_model(model, device)
    }
}

impl<B: Backend> GlyphClassifier for CnnClassifier<B> {
    fn classify(&self, glyph: &GlyphTensor) -> Result<ClassScores, ModelError> {
        let data = TensorData::new(glyph.to_vec(), [1, 3, GLYPH_SIZE, GLYPH_SIZE]);
        let input = Tensor::<B, 4>::from_data(data, &self.device);

        let model = self
            .model
            .lock()
            .map_err(|_| ModelError::Tensor("classifier lock poisoned".to_string()))?
            .clone();
        let output = model.forward(input);

        let scores = output
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| ModelError::Tensor(format!("{e:?}")))?;
        let scores: [f32; NUM_CLASSES] = scores
            .as_slice()
            .try_into()
            .map_err(|_| ModelError::UnexpectedOutput(scores.len()))?;

        Ok(ClassScores(scores))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn sample_tensor() -> GlyphTensor {
        let data = Array3::from_shape_fn((3, GLYPH_SIZE, GLYPH_SIZE), |(c, y, x)| {
            ((c + y * 3 + x * 7) % 17) as f32 / 8.5 - 1.0
        });
        GlyphTensor(data)
    }

    #[test]
    fn test_classify_is_deterministic() {
        let classifier = CnnClassifier::<InferenceBackend>::untrained(Default::default());
        let glyph = sample_tensor();

        let first = classifier.classify(&glyph).unwrap();
        let second = classifier.classify(&glyph).unwrap();
        assert_eq!(first, second);
        assert!(first.top1() < NUM_CLASSES);
    }

    #[test]
    fn test_parallel_classification_matches_serial() {
        let classifier = CnnClassifier::<InferenceBackend>::untrained(Default::default());
        let glyph = sample_tensor();
        let serial = classifier.classify(&glyph).unwrap();

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| classifier.classify(&glyph).unwrap()))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), serial);
            }
        });
    }

    #[test]
    fn test_load_missing_checkpoint_is_fatal() {
        let result = CnnClassifier::<InferenceBackend>::load(Path::new("/nonexistent/model1.pt"));
        assert!(matches!(result, Err(ModelError::CheckpointMissing(_))));
    }
}
