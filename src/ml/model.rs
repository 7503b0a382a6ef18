use burn::{
    module::Param,
    nn::{Initializer, Linear, LinearConfig},
    prelude::*,
    tensor::activation::{relu, sigmoid},
};

use crate::domain::features::FEATURE_COUNT;

/// Activation applied after a dense layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Relu,
    Sigmoid,
}

impl Activation {
    /// Keras / TF.js identifier
    pub fn as_str(self) -> &'static str {
        match self {
            Activation::Relu    => "relu",
            Activation::Sigmoid => "sigmoid",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "relu"    => Some(Activation::Relu),
            "sigmoid" => Some(Activation::Sigmoid),
            _         => None,
        }
    }
}

#[derive(Config, Debug)]
pub struct AdDetectorConfig {
    #[config(default = "FEATURE_COUNT")]
    pub input_dim: usize,
    #[config(default = "vec![64, 32, 16]")]
    pub hidden_units: Vec<usize>,
}

impl AdDetectorConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> AdDetectorModel<B> {
        let mut fan_in = self.input_dim;
        let hidden = self
            .hidden_units
            .iter()
            .map(|&units| {
                let layer = dense(fan_in, units, device);
                fan_in = units;
                layer
            })
            .collect();
        let output = dense(fan_in, 1, device);
        AdDetectorModel { hidden, output }
    }
}

// Glorot-uniform kernel and zero bias, same as a fresh Keras Dense layer.
fn dense<B: Backend>(d_input: usize, d_output: usize, device: &B::Device) -> Linear<B> {
    let mut layer = LinearConfig::new(d_input, d_output)
        .with_initializer(Initializer::XavierUniform { gain: 1.0 })
        .init(device);
    layer.bias = Some(Param::from_tensor(Tensor::zeros([d_output], device)));
    layer
}

/// Feed-forward ad classifier: relu hidden layers, one sigmoid output.
#[derive(Module, Debug)]
pub struct AdDetectorModel<B: Backend> {
    pub hidden: Vec<Linear<B>>,
    pub output: Linear<B>,
}

impl<B: Backend> AdDetectorModel<B> {
    /// features: [batch, 6] → logits: [batch, 1]
    pub fn forward_logits(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self
            .hidden
            .iter()
            .fold(features, |x, layer| relu(layer.forward(x)));
        self.output.forward(x)
    }

    /// features: [batch, 6] → probability of "ad": [batch, 1]
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        sigmoid(self.forward_logits(features))
    }

    /// Every dense layer in order, paired with its activation.
    pub fn layers(&self) -> Vec<(&Linear<B>, Activation)> {
        self.hidden
            .iter()
            .map(|l| (l, Activation::Relu))
            .chain(std::iter::once((&self.output, Activation::Sigmoid)))
            .collect()
    }

    /// `[d_input, d_output]` of every dense layer in order.
    pub fn layer_shapes(&self) -> Vec<[usize; 2]> {
        self.layers()
            .iter()
            .map(|(l, _)| l.weight.val().dims())
            .collect()
    }

    pub fn input_dim(&self) -> usize {
        self.layer_shapes().first().map(|s| s[0]).unwrap_or(0)
    }
}
