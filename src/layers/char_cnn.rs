// ============================================================
// Character-Word CNN
// ============================================================
// Turns a word's character embeddings into one fixed-size vector:
// a 1-D convolution slides a width-k window over the characters,
// ReLU rectifies, and a max-pool over the character axis keeps the
// strongest response per filter. Output width is the filter count
// regardless of word length (as long as word_len ≥ k; the
// embedding layer checks that before calling in).
//
// Reference: Kim (2014) Convolutional Neural Networks for
//            Sentence Classification

use burn::nn::conv::{Conv1d, Conv1dConfig};
use burn::prelude::*;
use burn::tensor::activation;

#[derive(Config, Debug)]
pub struct CharCnnConfig {
    pub char_emb_size: usize,
    pub n_filters:     usize,
    #[config(default = 5)]
    pub kernel_size:   usize,
}

impl CharCnnConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> CharCnn<B> {
        CharCnn {
            conv: Conv1dConfig::new(self.char_emb_size, self.n_filters, self.kernel_size)
                .init(device),
            kernel_size: self.kernel_size,
        }
    }
}

#[derive(Module, Debug)]
pub struct CharCnn<B: Backend> {
    conv:            Conv1d<B>,
    pub kernel_size: usize,
}

impl<B: Backend> CharCnn<B> {
    /// x: [words, char_emb_size, word_len] → [words, n_filters]
    ///
    /// Each row is one word laid out channels-first for the convolution.
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 2> {
        let conv = self.conv.forward(x);          // [words, n_filters, word_len - k + 1]
        let [words, n_filters, _] = conv.dims();
        activation::relu(conv)
            .max_dim(2)                           // [words, n_filters, 1]
            .reshape([words, n_filters])
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_output_width_is_filter_count_for_any_word_length() {
        let device = Default::default();
        let cnn = CharCnnConfig::new(8, 12).init::<TestBackend>(&device);
        for word_len in [5, 6, 9, 16] {
            let x = Tensor::<TestBackend, 3>::zeros([4, 8, word_len], &device);
            assert_eq!(cnn.forward(x).dims(), [4, 12]);
        }
    }

    #[test]
    fn test_max_pool_keeps_strongest_response() {
        // ReLU then max-pool: output can never be negative
        let device = Default::default();
        let cnn = CharCnnConfig::new(3, 5).with_kernel_size(2).init::<TestBackend>(&device);
        let x = Tensor::<TestBackend, 3>::random(
            [6, 3, 7], burn::tensor::Distribution::Uniform(-1.0, 1.0), &device,
        );
        let out: Vec<f32> = cnn.forward(x).into_data().to_vec().unwrap();
        assert!(out.iter().all(|v| *v >= 0.0));
    }
}
