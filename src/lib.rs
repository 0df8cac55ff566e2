//! Bidirectional attention flow (BiDAF) for extractive question
//! answering, built on [Burn](https://burn.dev).
//!
//! The crate implements the model architecture only: given padded
//! word (and optionally character) index tensors for a context and a
//! query, the forward pass returns two masked log-probability
//! distributions over context positions — the answer-span start and
//! end pointers. Training loops, tokenisation, vocabulary building
//! and span decoding belong to the surrounding application.
//!
//! ```ignore
//! use bidaf_qa::{Bidaf, BidafConfig};
//! use burn::prelude::*;
//!
//! type B = burn::backend::NdArray;
//! let device = Default::default();
//!
//! // Pretrained tables come from the embedding-loading collaborator
//! let model = BidafConfig::new(100, 0.2)
//!     .init::<B>(word_vectors, Some(char_vectors), &device)?;
//!
//! let pred = model.forward(context_words, query_words,
//!                          Some(context_chars), Some(query_chars))?;
//! // pred.log_p_start / pred.log_p_end: [batch, context_len]
//! ```
//!
//! All modules are generic over the Burn backend; parameters are
//! read-only during a forward pass, so a model can serve concurrent
//! passes on different inputs without extra locking.

pub mod config;
pub mod error;
pub mod layers;
pub mod mask;
pub mod model;

pub use config::{BidafConfig, RnnType};
pub use error::ModelError;
pub use model::{Bidaf, SpanPrediction};
