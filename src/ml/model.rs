use burn::{
    module::Param,
    nn::loss::CrossEntropyLossConfig,
    prelude::*,
    tensor::activation::relu,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::ml::bundle::DenseParams;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct MlpConfig {
    pub n_features:    usize,
    pub hidden_layers: Vec<usize>,
    pub n_classes:     usize,
    #[config(default = 42)]
    pub seed:          u64,
}

impl MlpConfig {
    /// Build the network with Glorot-uniform weights drawn from a
    /// StdRng seeded with `self.seed`, so the same config always
    /// yields the same starting point regardless of backend.
    pub fn init<B: Backend>(&self, device: &B::Device) -> MlpModel<B> {
        let mut rng = StdRng::seed_from_u64(self.seed);

        let widths: Vec<usize> = std::iter::once(self.n_features)
            .chain(self.hidden_layers.iter().copied())
            .chain(std::iter::once(self.n_classes))
            .collect();

        let layers = widths
            .windows(2)
            .map(|w| Dense::glorot(w[0], w[1], &mut rng, device))
            .collect();

        MlpModel { layers }
    }
}

/// Fully connected layer: y = x · W + b, W stored as [inputs, outputs].
#[derive(Module, Debug)]
pub struct Dense<B: Backend> {
    pub weight: Param<Tensor<B, 2>>,
    pub bias:   Param<Tensor<B, 1>>,
}

impl<B: Backend> Dense<B> {
    fn glorot(inputs: usize, outputs: usize, rng: &mut StdRng, device: &B::Device) -> Self {
        let bound = (6.0 / (inputs + outputs) as f64).sqrt();
        let mut draw = |n: usize| -> Vec<f32> {
            (0..n).map(|_| rng.gen_range(-bound..bound) as f32).collect()
        };

        let weight = Tensor::<B, 2>::from_data(
            TensorData::new(draw(inputs * outputs), [inputs, outputs]),
            device,
        );
        let bias = Tensor::<B, 1>::from_data(TensorData::new(draw(outputs), [outputs]), device);

        Self {
            weight: Param::from_tensor(weight),
            bias:   Param::from_tensor(bias),
        }
    }

    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        x.matmul(self.weight.val()) + self.bias.val().unsqueeze::<2>()
    }

    fn to_params(&self) -> anyhow::Result<DenseParams> {
        let [inputs, outputs] = self.weight.val().dims();
        let weight = self
            .weight
            .val()
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("Cannot read layer weights: {e:?}"))?;
        let bias = self
            .bias
            .val()
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("Cannot read layer bias: {e:?}"))?;
        Ok(DenseParams { inputs, outputs, weight, bias })
    }
}

/// ReLU multi-layer perceptron producing one logit per class.
#[derive(Module, Debug)]
pub struct MlpModel<B: Backend> {
    pub layers: Vec<Dense<B>>,
}

impl<B: Backend> MlpModel<B> {
    /// x: [batch, n_features] → logits: [batch, n_classes]
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let last = self.layers.len().saturating_sub(1);
        let mut x = x;
        for (i, layer) in self.layers.iter().enumerate() {
            x = layer.forward(x);
            // No activation on the output layer; softmax lives in the loss.
            if i < last {
                x = relu(x);
            }
        }
        x
    }

    /// Mean softmax cross-entropy over the batch, plus the logits.
    pub fn forward_loss(
        &self,
        x:       Tensor<B, 2>,
        targets: Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward(x);
        let ce     = CrossEntropyLossConfig::new().init(&logits.device());
        let loss   = ce.forward(logits.clone(), targets);
        (loss, logits)
    }

    /// Copy every layer out of the backend into plain vectors.
    pub fn to_params(&self) -> anyhow::Result<Vec<DenseParams>> {
        self.layers.iter().map(Dense::to_params).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{ndarray::NdArrayDevice, NdArray};

    #[test]
    fn test_layer_widths_follow_config() {
        let device = NdArrayDevice::default();
        let model: MlpModel<NdArray> = MlpConfig::new(4, vec![100, 50], 3).init(&device);
        let params = model.to_params().unwrap();

        let shapes: Vec<(usize, usize)> = params.iter().map(|p| (p.inputs, p.outputs)).collect();
        assert_eq!(shapes, vec![(4, 100), (100, 50), (50, 3)]);
        assert_eq!(params[0].weight.len(), 400);
        assert_eq!(params[2].bias.len(), 3);
    }

    #[test]
    fn test_same_seed_same_weights() {
        let device = NdArrayDevice::default();
        let a: MlpModel<NdArray> = MlpConfig::new(4, vec![8], 3).with_seed(7).init(&device);
        let b: MlpModel<NdArray> = MlpConfig::new(4, vec![8], 3).with_seed(7).init(&device);
        assert_eq!(a.to_params().unwrap(), b.to_params().unwrap());
    }

    #[test]
    fn test_forward_output_shape() {
        let device = NdArrayDevice::default();
        let model: MlpModel<NdArray> = MlpConfig::new(4, vec![6, 5], 3).init(&device);
        let x = Tensor::<NdArray, 2>::zeros([7, 4], &device);
        assert_eq!(model.forward(x).dims(), [7, 3]);
    }
}
