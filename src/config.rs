// ============================================================
// Model Configuration
// ============================================================
// All knobs a caller can turn, validated once at construction.
// A bad knob never survives to the first forward pass.
//
// Pretrained embedding tables are *not* configuration — they are
// injected into `BidafConfig::init` as tensors, so each model
// instance owns its own table references and no global state is
// involved.

use std::str::FromStr;

use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// The recurrent cell family used by every sequence-encoding pass.
/// Dispatched once at construction into the cell enum; swapping the
/// type never changes the packing/sorting contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RnnType {
    /// Long short-term memory cell (the reference choice)
    Lstm,
    /// Gated recurrent unit
    Gru,
    /// Vanilla tanh recurrent cell
    Tanh,
}

impl FromStr for RnnType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lstm" => Ok(RnnType::Lstm),
            "gru"  => Ok(RnnType::Gru),
            "tanh" | "rnn" => Ok(RnnType::Tanh),
            other  => Err(ModelError::UnknownRnnType(other.to_string())),
        }
    }
}

/// Configuration of the full BiDAF model.
///
/// `hidden_size` is the feature width after the embedding projection;
/// the encoder doubles it, attention fusion quadruples that again.
#[derive(Config, Debug)]
pub struct BidafConfig {
    pub hidden_size: usize,
    pub drop_prob:   f64,
    #[config(default = 2)]
    pub num_highway_layers: usize,
    #[config(default = 5)]
    pub cnn_kernel_size:    usize,
    #[config(default = "RnnType::Lstm")]
    pub rnn_type:           RnnType,
    /// Depth of the modeling encoder that runs over the attention output
    #[config(default = 2)]
    pub num_rnn_layers:     usize,
}

impl BidafConfig {
    /// Reject out-of-range knobs before any parameter is allocated.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.hidden_size == 0 {
            return Err(ModelError::InvalidConfig(
                "hidden_size must be at least 1".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.drop_prob) {
            return Err(ModelError::InvalidConfig(format!(
                "drop_prob must be in [0, 1), got {}",
                self.drop_prob
            )));
        }
        if self.cnn_kernel_size == 0 {
            return Err(ModelError::InvalidConfig(
                "cnn_kernel_size must be at least 1".into(),
            ));
        }
        if self.num_rnn_layers == 0 {
            return Err(ModelError::InvalidConfig(
                "num_rnn_layers must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
