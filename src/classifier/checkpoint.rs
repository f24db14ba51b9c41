//! Loading trained weights from a PyTorch checkpoint.
//!
//! The checkpoint is a pickled dict written by `torch.save`, holding the
//! network under `state_dict` next to the optimizer state. Only the network
//! is restored; optimizer state matters for resuming training, which this
//! crate never does.

use super::model::{DigitNet, DigitNetConfig, DigitNetRecord, expected_parameter_shapes};
use crate::error::ModelError;
use burn::module::Module;
use burn::record::{FullPrecisionSettings, Recorder};
use burn::tensor::backend::Backend;
use burn_import::pytorch::{LoadArgs, PyTorchFileRecorder};
use std::path::Path;
use tracing::info;

const STATE_DICT_KEY: &str = "state_dict";

/// Load a [`DigitNet`] and check every parameter against the declared architecture
pub fn load_digit_net<B: Backend>(path: &Path, device: &B::Device) -> Result<DigitNet<B>, ModelError> {
    if !path.is_file() {
        return Err(ModelError::CheckpointMissing(path.to_path_buf()));
    }

    let args = LoadArgs::new(path.to_path_buf()).with_top_level_key(STATE_DICT_KEY);
    let record: DigitNetRecord<B> = PyTorchFileRecorder::<FullPrecisionSettings>::default()
        .load(args, device)
        .map_err(|e| ModelError::CheckpointLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let model = DigitNetConfig::new().init::<B>(device).load_record(record);
    verify_architecture(&model)?;

    info!(checkpoint = %path.display(), "loaded digit network");
    Ok(model)
}

/// Fail if any parameter shape differs from what the network declares
pub fn verify_architecture<B: Backend>(model: &DigitNet<B>) -> Result<(), ModelError> {
    for ((name, actual), (_, expected)) in model
        .parameter_shapes()
        .into_iter()
        .zip(expected_parameter_shapes())
    {
        if actual != expected {
            return Err(ModelError::IncompatibleShape {
                name,
                expected,
                actual,
            });
        }
    }
    Ok(())
}
