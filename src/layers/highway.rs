// ============================================================
// Highway Encoder
// ============================================================
// Stacked gated residual layers. Each layer blends a learned
// transform with the identity, per feature, per position:
//
//   g = sigmoid(W_g x + b_g)
//   t = relu(W_t x + b_t)
//   out = g ⊙ t + (1 − g) ⊙ x
//
// Output shape equals input shape at every layer, so any number
// of layers (including zero, the identity) can be stacked.
//
// Reference: Srivastava et al. (2015) Highway Networks

use burn::nn::{Linear, LinearConfig};
use burn::prelude::*;
use burn::tensor::activation;

#[derive(Config, Debug)]
pub struct HighwayEncoderConfig {
    pub hidden_size: usize,
    #[config(default = 2)]
    pub num_layers:  usize,
}

impl HighwayEncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> HighwayEncoder<B> {
        let layers = (0..self.num_layers)
            .map(|_| HighwayLayer {
                gate:      LinearConfig::new(self.hidden_size, self.hidden_size).init(device),
                transform: LinearConfig::new(self.hidden_size, self.hidden_size).init(device),
            })
            .collect();
        HighwayEncoder { layers }
    }
}

#[derive(Module, Debug)]
struct HighwayLayer<B: Backend> {
    gate:      Linear<B>,
    transform: Linear<B>,
}

#[derive(Module, Debug)]
pub struct HighwayEncoder<B: Backend> {
    layers: Vec<HighwayLayer<B>>,
}

impl<B: Backend> HighwayEncoder<B> {
    /// x: [batch, seq_len, hidden] → [batch, seq_len, hidden]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let mut x = x;
        for layer in &self.layers {
            let g = activation::sigmoid(layer.gate.forward(x.clone()));
            let t = activation::relu(layer.transform.forward(x.clone()));
            x = g.clone() * t + (g.ones_like() - g) * x;
        }
        x
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_shape_preserved_across_layer_counts() {
        let device = Default::default();
        for num_layers in [0, 1, 2, 4] {
            let hwy = HighwayEncoderConfig::new(6)
                .with_num_layers(num_layers)
                .init::<TestBackend>(&device);
            let x = Tensor::<TestBackend, 3>::zeros([3, 5, 6], &device);
            assert_eq!(hwy.forward(x).dims(), [3, 5, 6]);
        }
    }

    #[test]
    fn test_zero_layers_is_identity() {
        let device = Default::default();
        let hwy = HighwayEncoderConfig::new(2)
            .with_num_layers(0)
            .init::<TestBackend>(&device);
        let x = Tensor::<TestBackend, 2>::from_floats(
            [[1.5, -2.0], [0.0, 3.25]], &device,
        ).reshape([1, 2, 2]);

        let out: Vec<f32> = hwy.forward(x).into_data().to_vec().unwrap();
        assert_eq!(out, vec![1.5, -2.0, 0.0, 3.25]);
    }

    #[test]
    fn test_output_is_convex_blend_when_gate_saturates() {
        // With freshly initialised small weights the gate sits near 0.5,
        // so the output must lie between relu(transform) and the input —
        // just sanity-check it stays finite and shaped.
        let device = Default::default();
        let hwy = HighwayEncoderConfig::new(4).init::<TestBackend>(&device);
        let x = Tensor::<TestBackend, 3>::ones([2, 3, 4], &device);
        let out: Vec<f32> = hwy.forward(x).into_data().to_vec().unwrap();
        assert!(out.iter().all(|v| v.is_finite()));
    }
}
