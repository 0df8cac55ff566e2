// ============================================================
// Output Layer (span pointer head)
// ============================================================
// Produces the two final log-probability distributions over
// context positions. The start pointer sums a projection of the
// attention output with a projection of the modeling output; the
// end pointer does the same after one more bidirectional encoding
// pass over the modeling output, so it can condition on where
// spans tend to begin. Both logit vectors go through the masked
// log-softmax, driving padding positions to effectively zero
// mass. Picking the best non-crossing (start, end) pair is the
// caller's job.

use burn::nn::{Linear, LinearConfig};
use burn::prelude::*;

use crate::config::RnnType;
use crate::error::ModelError;
use crate::layers::encoder::{SequenceEncoder, SequenceEncoderConfig};
use crate::mask::masked_log_softmax;

#[derive(Config, Debug)]
pub struct OutputLayerConfig {
    pub hidden_size: usize,
    pub drop_prob:   f64,
    #[config(default = "RnnType::Lstm")]
    pub rnn_type:    RnnType,
}

impl OutputLayerConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> OutputLayer<B> {
        let h = self.hidden_size;
        OutputLayer {
            att_linear_1: LinearConfig::new(8 * h, 1).init(device),
            mod_linear_1: LinearConfig::new(2 * h, 1).init(device),
            rnn: SequenceEncoderConfig::new(2 * h, h)
                .with_rnn_type(self.rnn_type)
                .with_drop_prob(self.drop_prob)
                .init(device),
            att_linear_2: LinearConfig::new(8 * h, 1).init(device),
            mod_linear_2: LinearConfig::new(2 * h, 1).init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct OutputLayer<B: Backend> {
    att_linear_1: Linear<B>,
    mod_linear_1: Linear<B>,
    rnn:          SequenceEncoder<B>,
    att_linear_2: Linear<B>,
    mod_linear_2: Linear<B>,
}

impl<B: Backend> OutputLayer<B> {
    /// att: [batch, c_len, 8·hidden] (attention fusion),
    /// mod_out: [batch, c_len, 2·hidden] (modeling encoder output),
    /// mask/lengths: context padding information
    /// → (log_p_start, log_p_end), each [batch, c_len]
    pub fn forward(
        &self,
        att: Tensor<B, 3>,
        mod_out: Tensor<B, 3>,
        mask: Tensor<B, 2, Bool>,
        lengths: &[usize],
    ) -> Result<(Tensor<B, 2>, Tensor<B, 2>), ModelError> {
        let [batch, c_len, _] = att.dims();
        if mod_out.dims()[0] != batch || mod_out.dims()[1] != c_len {
            return Err(ModelError::shape(
                "output layer: attention/modeling agreement",
                format!("[{batch}, {c_len}, _]"),
                format!("{:?}", mod_out.dims()),
            ));
        }
        if mask.dims() != [batch, c_len] {
            return Err(ModelError::shape(
                "output layer: context mask",
                format!("[{batch}, {c_len}]"),
                format!("{:?}", mask.dims()),
            ));
        }

        let logits_1 = (self.att_linear_1.forward(att.clone())
            + self.mod_linear_1.forward(mod_out.clone()))
            .reshape([batch, c_len]);

        let mod_2 = self.rnn.forward(mod_out, lengths)?; // [batch, c_len, 2·hidden]

        let logits_2 = (self.att_linear_2.forward(att)
            + self.mod_linear_2.forward(mod_2))
            .reshape([batch, c_len]);

        let log_p_start = masked_log_softmax(logits_1, mask.clone(), 1);
        let log_p_end   = masked_log_softmax(logits_2, mask, 1);
        Ok((log_p_start, log_p_end))
    }
}
