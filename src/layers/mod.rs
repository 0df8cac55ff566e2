// ============================================================
// Model Layers
// ============================================================
// The building blocks of the BiDAF architecture, leaf-first:
//
//   highway.rs   — gated residual transform stack
//   char_cnn.rs  — per-word character CNN (conv → relu → max-pool)
//   embedding.rs — word / word+character token embeddings
//   encoder.rs   — packed bidirectional recurrent encoder
//   attention.rs — trilinear bidirectional attention flow
//   output.rs    — start/end span pointer head
//
// Every layer is a burn Module, generic over the backend, and a
// pure function of its inputs and parameters: activations are
// created per forward pass and owned by the caller, parameters
// are owned by the layer and read-only during a pass.

pub mod attention;
pub mod char_cnn;
pub mod embedding;
pub mod encoder;
pub mod highway;
pub mod output;

pub use attention::{BidafAttention, BidafAttentionConfig};
pub use char_cnn::{CharCnn, CharCnnConfig};
pub use embedding::{
    TokenEmbedding, WordCharEmbedding, WordCharEmbeddingConfig, WordEmbedding,
    WordEmbeddingConfig,
};
pub use encoder::{SequenceEncoder, SequenceEncoderConfig};
pub use highway::{HighwayEncoder, HighwayEncoderConfig};
pub use output::{OutputLayer, OutputLayerConfig};
