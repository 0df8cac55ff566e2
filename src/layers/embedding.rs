// ============================================================
// Embedding Layer
// ============================================================
// Produces per-token vectors for the encoder. Two variants:
//
//   WordEmbedding     — pretrained word vectors only
//   WordCharEmbedding — word vectors concatenated with a
//                       CNN-derived character vector per word
//
// Both end the same way: dropout → bias-free projection to
// hidden_size → highway encoder. Which variant a model uses is
// decided once at construction and dispatched through the
// TokenEmbedding enum.
//
// The word table is pretrained and treated as frozen; the
// character table is intended to be fine-tuned. That distinction
// only matters to a trainer's gradient flow — the forward
// contract here is identical for both tables.

use burn::module::Param;
use burn::nn::{Dropout, DropoutConfig, Embedding, Linear, LinearConfig};
use burn::prelude::*;

use crate::error::ModelError;
use crate::layers::char_cnn::{CharCnn, CharCnnConfig};
use crate::layers::highway::{HighwayEncoder, HighwayEncoderConfig};

/// Wrap a pretrained vector table as an embedding lookup module.
fn from_pretrained<B: Backend>(vectors: Tensor<B, 2>) -> Embedding<B> {
    Embedding { weight: Param::from_tensor(vectors) }
}

// ─── Word-only variant ────────────────────────────────────────────────────────

#[derive(Config, Debug)]
pub struct WordEmbeddingConfig {
    pub hidden_size: usize,
    pub drop_prob:   f64,
    #[config(default = 2)]
    pub num_highway_layers: usize,
}

impl WordEmbeddingConfig {
    /// `word_vectors`: pretrained table, [vocab_size, word_emb_size].
    pub fn init<B: Backend>(&self, word_vectors: Tensor<B, 2>, device: &B::Device) -> WordEmbedding<B> {
        let [_, word_emb_size] = word_vectors.dims();
        WordEmbedding {
            embed:   from_pretrained(word_vectors),
            dropout: DropoutConfig::new(self.drop_prob).init(),
            proj:    LinearConfig::new(word_emb_size, self.hidden_size)
                .with_bias(false)
                .init(device),
            hwy:     HighwayEncoderConfig::new(self.hidden_size)
                .with_num_layers(self.num_highway_layers)
                .init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct WordEmbedding<B: Backend> {
    embed:   Embedding<B>,
    dropout: Dropout,
    proj:    Linear<B>,
    hwy:     HighwayEncoder<B>,
}

impl<B: Backend> WordEmbedding<B> {
    /// words: [batch, seq_len] → [batch, seq_len, hidden_size]
    pub fn forward(&self, words: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let emb = self.embed.forward(words);     // [batch, seq_len, word_emb_size]
        let emb = self.dropout.forward(emb);
        self.hwy.forward(self.proj.forward(emb)) // [batch, seq_len, hidden_size]
    }
}

// ─── Word + character variant ─────────────────────────────────────────────────

#[derive(Config, Debug)]
pub struct WordCharEmbeddingConfig {
    pub hidden_size: usize,
    pub drop_prob:   f64,
    #[config(default = 2)]
    pub num_highway_layers: usize,
    #[config(default = 5)]
    pub cnn_kernel_size:    usize,
}

impl WordCharEmbeddingConfig {
    /// `word_vectors`: [vocab_size, word_emb_size] (pretrained, frozen).
    /// `char_vectors`: [char_vocab_size, char_emb_size] (fine-tunable).
    ///
    /// The CNN filter count is set to the word embedding size so the
    /// character vector concatenates 1:1 with the word vector.
    pub fn init<B: Backend>(
        &self,
        word_vectors: Tensor<B, 2>,
        char_vectors: Tensor<B, 2>,
        device: &B::Device,
    ) -> WordCharEmbedding<B> {
        let [_, word_emb_size] = word_vectors.dims();
        let [_, char_emb_size] = char_vectors.dims();
        WordCharEmbedding {
            word_embed: from_pretrained(word_vectors),
            char_embed: from_pretrained(char_vectors),
            cnn: CharCnnConfig::new(char_emb_size, word_emb_size)
                .with_kernel_size(self.cnn_kernel_size)
                .init(device),
            dropout: DropoutConfig::new(self.drop_prob).init(),
            proj: LinearConfig::new(2 * word_emb_size, self.hidden_size)
                .with_bias(false)
                .init(device),
            hwy: HighwayEncoderConfig::new(self.hidden_size)
                .with_num_layers(self.num_highway_layers)
                .init(device),
            word_emb_size,
        }
    }
}

#[derive(Module, Debug)]
pub struct WordCharEmbedding<B: Backend> {
    word_embed: Embedding<B>,
    char_embed: Embedding<B>,
    cnn:        CharCnn<B>,
    dropout:    Dropout,
    proj:       Linear<B>,
    hwy:        HighwayEncoder<B>,
    word_emb_size: usize,
}

impl<B: Backend> WordCharEmbedding<B> {
    /// words: [batch, seq_len], chars: [batch, seq_len, max_word_len]
    /// → [batch, seq_len, hidden_size]
    pub fn forward(
        &self,
        words: Tensor<B, 2, Int>,
        chars: Tensor<B, 3, Int>,
    ) -> Result<Tensor<B, 3>, ModelError> {
        let [batch, seq_len] = words.dims();
        let [c_batch, c_seq_len, max_word_len] = chars.dims();

        if (c_batch, c_seq_len) != (batch, seq_len) {
            return Err(ModelError::shape(
                "embedding: word/char index agreement",
                format!("char tensor leading dims [{batch}, {seq_len}]"),
                format!("[{c_batch}, {c_seq_len}]"),
            ));
        }
        if max_word_len < self.cnn.kernel_size {
            return Err(ModelError::shape(
                "embedding: word length vs cnn kernel",
                format!("max_word_len >= {}", self.cnn.kernel_size),
                max_word_len,
            ));
        }

        // Every word becomes an independent row for the CNN, then the
        // per-word vectors are folded back into the sequence layout.
        let chars    = chars.reshape([batch * seq_len, max_word_len]);
        let emb_char = self.char_embed.forward(chars)   // [b·s, max_word_len, char_emb]
            .swap_dims(1, 2);                           // [b·s, char_emb, max_word_len]
        let emb_char = self.cnn.forward(emb_char)       // [b·s, word_emb_size]
            .reshape([batch, seq_len, self.word_emb_size]);

        let emb_word = self.word_embed.forward(words);  // [batch, seq_len, word_emb_size]

        let emb = Tensor::cat(vec![emb_word, emb_char], 2); // [batch, seq_len, 2·word_emb]
        let emb = self.dropout.forward(emb);
        Ok(self.hwy.forward(self.proj.forward(emb)))    // [batch, seq_len, hidden_size]
    }
}

// ─── Construction-time dispatch ───────────────────────────────────────────────

/// The embedding variant is chosen once when the model is built; forward
/// logic matches on the enum, never on configuration strings.
#[derive(Module, Debug)]
pub enum TokenEmbedding<B: Backend> {
    Word(WordEmbedding<B>),
    WordChar(WordCharEmbedding<B>),
}

impl<B: Backend> TokenEmbedding<B> {
    pub fn forward(
        &self,
        words: Tensor<B, 2, Int>,
        chars: Option<Tensor<B, 3, Int>>,
    ) -> Result<Tensor<B, 3>, ModelError> {
        match self {
            TokenEmbedding::Word(emb) => Ok(emb.forward(words)),
            TokenEmbedding::WordChar(emb) => {
                let chars = chars.ok_or(ModelError::MissingCharacterInput)?;
                emb.forward(words, chars)
            }
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    fn word_table(device: &<TestBackend as Backend>::Device) -> Tensor<TestBackend, 2> {
        // vocab 10, word_emb 6
        Tensor::random([10, 6], burn::tensor::Distribution::Uniform(-0.5, 0.5), device)
    }

    fn char_table(device: &<TestBackend as Backend>::Device) -> Tensor<TestBackend, 2> {
        // char vocab 20, char_emb 4
        Tensor::random([20, 4], burn::tensor::Distribution::Uniform(-0.5, 0.5), device)
    }

    #[test]
    fn test_word_embedding_projects_to_hidden_size() {
        let device = Default::default();
        let emb = WordEmbeddingConfig::new(8, 0.1).init(word_table(&device), &device);
        let words = Tensor::<TestBackend, 1, Int>::from_ints(
            [1, 2, 3, 0, 4, 5, 0, 0], &device,
        ).reshape([2, 4]);
        assert_eq!(emb.forward(words).dims(), [2, 4, 8]);
    }

    #[test]
    fn test_word_char_embedding_shapes() {
        let device = Default::default();
        let emb = WordCharEmbeddingConfig::new(8, 0.1)
            .init(word_table(&device), char_table(&device), &device);

        let words = Tensor::<TestBackend, 1, Int>::from_ints([1, 2, 3, 0], &device)
            .reshape([1, 4]);
        let chars = Tensor::<TestBackend, 3, Int>::zeros([1, 4, 6], &device);

        let out = emb.forward(words, chars).unwrap();
        assert_eq!(out.dims(), [1, 4, 8]);
    }

    #[test]
    fn test_word_char_embedding_rejects_short_words() {
        // max_word_len 3 < kernel 5
        let device = Default::default();
        let emb = WordCharEmbeddingConfig::new(8, 0.0)
            .init(word_table(&device), char_table(&device), &device);

        let words = Tensor::<TestBackend, 1, Int>::from_ints([1, 2], &device).reshape([1, 2]);
        let chars = Tensor::<TestBackend, 3, Int>::zeros([1, 2, 3], &device);

        let err = emb.forward(words, chars).unwrap_err();
        assert!(matches!(err, ModelError::ShapeMismatch { .. }), "got {err}");
    }

    #[test]
    fn test_word_char_embedding_rejects_mismatched_batches() {
        let device = Default::default();
        let emb = WordCharEmbeddingConfig::new(8, 0.0)
            .init(word_table(&device), char_table(&device), &device);

        let words = Tensor::<TestBackend, 1, Int>::from_ints([1, 2], &device).reshape([1, 2]);
        let chars = Tensor::<TestBackend, 3, Int>::zeros([2, 2, 6], &device);

        assert!(emb.forward(words, chars).is_err());
    }

    #[test]
    fn test_token_embedding_requires_chars_for_word_char_variant() {
        let device = Default::default();
        let emb = TokenEmbedding::WordChar(
            WordCharEmbeddingConfig::new(8, 0.0)
                .init(word_table(&device), char_table(&device), &device),
        );
        let words = Tensor::<TestBackend, 1, Int>::from_ints([1, 2], &device).reshape([1, 2]);

        let err = emb.forward(words, None).unwrap_err();
        assert!(matches!(err, ModelError::MissingCharacterInput));
    }
}
