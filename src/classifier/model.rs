//! The digit network: two conv/ReLU/max-pool stages and two dense layers.

use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{MaxPool2d, MaxPool2dConfig};
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig, Relu};
use burn::prelude::*;

/// Features left after the second pool: 16 channels of 6x6
pub const FLAT_FEATURES: usize = 16 * 6 * 6;

/// Field names match the PyTorch `state_dict` keys (`conv1.weight`, `fc2.bias`, ...)
#[derive(Module, Debug)]
pub struct DigitNet<B: Backend> {
    conv1: Conv2d<B>,
    pool: MaxPool2d,
    conv2: Conv2d<B>,
    fc1: Linear<B>,
    fc2: Linear<B>,
    dropout: Dropout,
    activation: Relu,
}

#[derive(Config, Debug)]
pub struct DigitNetConfig {
    #[config(default = "11")]
    pub num_classes: usize,
    #[config(default = "128")]
    pub hidden_size: usize,
    #[config(default = "0.1")]
    pub dropout: f64,
}

impl DigitNetConfig {
    /// Returns a network with freshly initialized weights
    pub fn init<B: Backend>(&self, device: &B::Device) -> DigitNet<B> {
        DigitNet {
            conv1: Conv2dConfig::new([3, 8], [3, 3]).init(device),
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
            conv2: Conv2dConfig::new([8, 16], [3, 3]).init(device),
            fc1: LinearConfig::new(FLAT_FEATURES, self.hidden_size).init(device),
            fc2: LinearConfig::new(self.hidden_size, self.num_classes).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            activation: Relu::new(),
        }
    }
}

impl<B: Backend> DigitNet<B> {
    /// # Shapes
    ///   - Images [batch_size, 3, 32, 32]
    ///   - Output [batch_size, num_classes]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.conv1.forward(images); // [batch_size, 8, 30, 30]
        let x = self.pool.forward(self.activation.forward(x)); // [batch_size, 8, 15, 15]
        let x = self.conv2.forward(x); // [batch_size, 16, 13, 13]
        let x = self.pool.forward(self.activation.forward(x)); // [batch_size, 16, 6, 6]

        let [batch_size, channels, height, width] = x.dims();
        let x = x.reshape([batch_size, channels * height * width]);

        // Dropout is a no-op unless the backend tracks gradients
        let x = self.dropout.forward(self.activation.forward(self.fc1.forward(x)));
        self.fc2.forward(x)
    }

    /// Parameter shapes keyed by checkpoint name. Dense weights are listed in
    /// burn's `[d_input, d_output]` layout.
    pub fn parameter_shapes(&self) -> Vec<(&'static str, Vec<usize>)> {
        let bias_dims = |bias: &Option<burn::module::Param<Tensor<B, 1>>>| {
            bias.as_ref().map(|b| b.val().dims().to_vec()).unwrap_or_default()
        };

        vec![
            ("conv1.weight", self.conv1.weight.val().dims().to_vec()),
            ("conv1.bias", bias_dims(&self.conv1.bias)),
            ("conv2.weight", self.conv2.weight.val().dims().to_vec()),
            ("conv2.bias", bias_dims(&self.conv2.bias)),
            ("fc1.weight", self.fc1.weight.val().dims().to_vec()),
            ("fc1.bias", bias_dims(&self.fc1.bias)),
            ("fc2.weight", self.fc2.weight.val().dims().to_vec()),
            ("fc2.bias", bias_dims(&self.fc2.bias)),
        ]
    }
}

/// Shapes a checkpoint must provide for [`DigitNet`]
pub fn expected_parameter_shapes() -> Vec<(&'static str, Vec<usize>)> {
    vec![
        ("conv1.weight", vec![8, 3, 3, 3]),
        ("conv1.bias", vec![8]),
        ("conv2.weight", vec![16, 8, 3, 3]),
        ("conv2.bias", vec![16]),
        ("fc1.weight", vec![FLAT_FEATURES, 128]),
        ("fc1.bias", vec![128]),
        ("fc2.weight", vec![128, 11]),
        ("fc2.bias", vec![11]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_forward_output_shape() {
        let device = Default::default();
        let model = DigitNetConfig::new().init::<TestBackend>(&device);

        let images = Tensor::<TestBackend, 4>::zeros([2, 3, 32, 32], &device);
        let output = model.forward(images);
        assert_eq!(output.dims(), [2, 11]);
    }

    #[test]
    fn test_default_init_matches_expected_shapes() {
        let device = Default::default();
        let model = DigitNetConfig::new().init::<TestBackend>(&device);
        assert_eq!(model.parameter_shapes(), expected_parameter_shapes());
    }
}
