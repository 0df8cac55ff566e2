// ============================================================
// Error Taxonomy
// ============================================================
// Every failure a caller can trigger falls into one of three
// families:
//   - shape-mismatch: an input tensor violates a layer contract
//   - configuration:  an out-of-range knob, caught at build time
//   - degenerate input: empty sequences fed to the packer
//
// Errors are surfaced synchronously from the constructor or
// forward pass that detected them. There is no retry path —
// numerical errors are never transient — and each variant
// carries the offending shapes/values, not just a message.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    /// An input tensor's dimensions violate the contract of the layer
    /// that received it. `context` names the layer and the check.
    #[error("shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        context:  &'static str,
        expected: String,
        actual:   String,
    },

    /// A configuration knob is out of range. Raised when the model is
    /// built, never at the first forward call.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An unrecognised recurrent cell name.
    #[error("unknown rnn type '{0}' (expected one of: lstm, gru, tanh)")]
    UnknownRnnType(String),

    /// A sequence with zero real tokens reached the sequence encoder.
    /// Packing an empty sequence is undefined, so it is rejected.
    #[error("sequence at batch index {index} has zero length; cannot pack an empty sequence")]
    EmptySequence { index: usize },

    /// The model was built with character embeddings but the forward
    /// pass received no character index tensors.
    #[error("model was built with character embeddings but no character indices were provided")]
    MissingCharacterInput,
}

impl ModelError {
    /// Shorthand for building a `ShapeMismatch` from anything printable.
    pub(crate) fn shape(
        context: &'static str,
        expected: impl std::fmt::Display,
        actual: impl std::fmt::Display,
    ) -> Self {
        ModelError::ShapeMismatch {
            context,
            expected: expected.to_string(),
            actual:   actual.to_string(),
        }
    }
}
