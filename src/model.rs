// ============================================================
// BiDAF Model Assembly
// ============================================================
// Wires the layers into the full pipeline:
//
//   token/char indices
//     → TokenEmbedding                  (hidden)
//     → SequenceEncoder (context, query separately)   (2·hidden)
//     → BidafAttention                  (8·hidden)
//     → modeling SequenceEncoder        (2·hidden)
//     → OutputLayer → (log_p_start, log_p_end)
//
// Masks and true lengths are derived once here, from the
// index-zero padding convention, and threaded through every
// stage. The forward pass is a pure function of the inputs and
// parameters: no state survives between calls, and parameters
// are read-only during a pass, so one model may serve concurrent
// forward passes on different inputs.
//
// Reference: Seo et al. (2017) Bidirectional Attention Flow
//            for Machine Comprehension

use burn::prelude::*;

use crate::config::BidafConfig;
use crate::error::ModelError;
use crate::layers::{
    BidafAttention, BidafAttentionConfig, OutputLayer, OutputLayerConfig, SequenceEncoder,
    SequenceEncoderConfig, TokenEmbedding, WordCharEmbeddingConfig, WordEmbeddingConfig,
};
use crate::mask::{mask_lengths, padding_mask};

impl BidafConfig {
    /// Build the model. Pretrained tables are injected here — the word
    /// table always, the character table only when the word+character
    /// embedding variant is wanted. Configuration errors surface now,
    /// never at the first forward call.
    pub fn init<B: Backend>(
        &self,
        word_vectors: Tensor<B, 2>,
        char_vectors: Option<Tensor<B, 2>>,
        device: &B::Device,
    ) -> Result<Bidaf<B>, ModelError> {
        self.validate()?;
        let h = self.hidden_size;
        let with_chars = char_vectors.is_some();

        let embedding = match char_vectors {
            Some(char_vectors) => TokenEmbedding::WordChar(
                WordCharEmbeddingConfig::new(h, self.drop_prob)
                    .with_num_highway_layers(self.num_highway_layers)
                    .with_cnn_kernel_size(self.cnn_kernel_size)
                    .init(word_vectors, char_vectors, device),
            ),
            None => TokenEmbedding::Word(
                WordEmbeddingConfig::new(h, self.drop_prob)
                    .with_num_highway_layers(self.num_highway_layers)
                    .init(word_vectors, device),
            ),
        };

        let model = Bidaf {
            embedding,
            encoder: SequenceEncoderConfig::new(h, h)
                .with_rnn_type(self.rnn_type)
                .with_drop_prob(self.drop_prob)
                .init(device),
            attention: BidafAttentionConfig::new(2 * h)
                .with_drop_prob(self.drop_prob)
                .init(device),
            modeling: SequenceEncoderConfig::new(8 * h, h)
                .with_num_layers(self.num_rnn_layers)
                .with_rnn_type(self.rnn_type)
                .with_drop_prob(self.drop_prob)
                .init(device),
            output: OutputLayerConfig::new(h, self.drop_prob)
                .with_rnn_type(self.rnn_type)
                .init(device),
        };

        tracing::info!(
            hidden_size = h,
            rnn_type = ?self.rnn_type,
            char_embeddings = with_chars,
            "initialised BiDAF model",
        );
        Ok(model)
    }
}

/// The two span-pointer distributions, log-probabilities over
/// context positions. Span selection is the consumer's job.
#[derive(Debug, Clone)]
pub struct SpanPrediction<B: Backend> {
    /// [batch, context_len]
    pub log_p_start: Tensor<B, 2>,
    /// [batch, context_len]
    pub log_p_end:   Tensor<B, 2>,
}

#[derive(Module, Debug)]
pub struct Bidaf<B: Backend> {
    embedding: TokenEmbedding<B>,
    encoder:   SequenceEncoder<B>,
    attention: BidafAttention<B>,
    modeling:  SequenceEncoder<B>,
    output:    OutputLayer<B>,
}

impl<B: Backend> Bidaf<B> {
    /// context_words / query_words: [batch, len] token indices (0 = pad);
    /// context_chars / query_chars: [batch, len, max_word_len] character
    /// indices, required iff the model was built with a character table.
    pub fn forward(
        &self,
        context_words: Tensor<B, 2, Int>,
        query_words: Tensor<B, 2, Int>,
        context_chars: Option<Tensor<B, 3, Int>>,
        query_chars: Option<Tensor<B, 3, Int>>,
    ) -> Result<SpanPrediction<B>, ModelError> {
        tracing::debug!(
            context = ?context_words.dims(),
            query = ?query_words.dims(),
            "bidaf forward",
        );

        // Single derivation point for padding information
        let c_mask = padding_mask(&context_words);
        let q_mask = padding_mask(&query_words);
        let c_lengths = mask_lengths(&c_mask);
        let q_lengths = mask_lengths(&q_mask);

        let c_emb = self.embedding.forward(context_words, context_chars)?; // [b, Lc, h]
        let q_emb = self.embedding.forward(query_words, query_chars)?;     // [b, Lq, h]

        let c_enc = self.encoder.forward(c_emb, &c_lengths)?; // [b, Lc, 2h]
        let q_enc = self.encoder.forward(q_emb, &q_lengths)?; // [b, Lq, 2h]

        let att = self
            .attention
            .forward(c_enc, q_enc, c_mask.clone(), q_mask)?;  // [b, Lc, 8h]

        let mod_out = self.modeling.forward(att.clone(), &c_lengths)?; // [b, Lc, 2h]

        let (log_p_start, log_p_end) =
            self.output.forward(att, mod_out, c_mask, &c_lengths)?;

        Ok(SpanPrediction { log_p_start, log_p_end })
    }
}
