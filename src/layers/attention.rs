// ============================================================
// Bidirectional Attention Flow
// ============================================================
// The defining layer of the architecture. For encoded context c
// (length Lc) and query q (length Lq), both H wide, a trilinear
// similarity is scored for every position pair:
//
//   s[i,j] = Wc·c_i + Wq·q_j + c_i·(Wcq ⊙ q_j) + bias
//
// Two masked softmaxes follow: s1 over the query axis (attend
// context → query, padding queries get zero mass) and s2 over the
// context axis. The fused output concatenates exactly
//
//   [c, a, c ⊙ a, c ⊙ b]   with a = s1·q, b = s1·s2ᵀ·c
//
// in this order, quadrupling the feature width. The similarity
// matrix never leaves this layer.
//
// Reference: Seo et al. (2017) Bidirectional Attention Flow
//            for Machine Comprehension

use burn::module::Param;
use burn::nn::{Dropout, DropoutConfig};
use burn::prelude::*;
use burn::tensor::Distribution;

use crate::error::ModelError;
use crate::mask::masked_softmax;

/// Xavier-uniform sample, matching the original initialisation of
/// the three similarity weights.
fn xavier<B: Backend, const D: usize>(
    shape: [usize; D],
    fan_in: usize,
    fan_out: usize,
    device: &B::Device,
) -> Param<Tensor<B, D>> {
    let bound = (6.0 / (fan_in + fan_out) as f64).sqrt();
    Param::from_tensor(Tensor::random(shape, Distribution::Uniform(-bound, bound), device))
}

#[derive(Config, Debug)]
pub struct BidafAttentionConfig {
    /// Feature width of the encoded context/query (2·hidden after the
    /// bidirectional encoder)
    pub input_size: usize,
    #[config(default = 0.1)]
    pub drop_prob:  f64,
}

impl BidafAttentionConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> BidafAttention<B> {
        let h = self.input_size;
        BidafAttention {
            c_weight:  xavier([h, 1], h, 1, device),
            q_weight:  xavier([h, 1], h, 1, device),
            cq_weight: xavier([1, 1, h], 1, h, device),
            bias:      Param::from_tensor(Tensor::zeros([1], device)),
            dropout:   DropoutConfig::new(self.drop_prob).init(),
            input_size: h,
        }
    }
}

#[derive(Module, Debug)]
pub struct BidafAttention<B: Backend> {
    c_weight:  Param<Tensor<B, 2>>, // [H, 1]
    q_weight:  Param<Tensor<B, 2>>, // [H, 1]
    cq_weight: Param<Tensor<B, 3>>, // [1, 1, H]
    bias:      Param<Tensor<B, 1>>,
    dropout:   Dropout,
    input_size: usize,
}

impl<B: Backend> BidafAttention<B> {
    /// c: [batch, c_len, H], q: [batch, q_len, H],
    /// c_mask: [batch, c_len], q_mask: [batch, q_len]
    /// → [batch, c_len, 4·H]
    pub fn forward(
        &self,
        c: Tensor<B, 3>,
        q: Tensor<B, 3>,
        c_mask: Tensor<B, 2, Bool>,
        q_mask: Tensor<B, 2, Bool>,
    ) -> Result<Tensor<B, 3>, ModelError> {
        let [batch, c_len, c_width] = c.dims();
        let [q_batch, q_len, q_width] = q.dims();

        if q_batch != batch {
            return Err(ModelError::shape(
                "attention: context/query batch agreement",
                batch,
                q_batch,
            ));
        }
        if c_width != self.input_size || q_width != self.input_size {
            return Err(ModelError::shape(
                "attention: input feature width",
                self.input_size,
                format!("context {c_width}, query {q_width}"),
            ));
        }
        if c_mask.dims() != [batch, c_len] || q_mask.dims() != [batch, q_len] {
            return Err(ModelError::shape(
                "attention: mask shapes",
                format!("[{batch}, {c_len}] and [{batch}, {q_len}]"),
                format!("{:?} and {:?}", c_mask.dims(), q_mask.dims()),
            ));
        }

        let s = self.similarity(c.clone(), q.clone()); // [batch, c_len, q_len]

        // Broadcast each mask over the axis it does NOT normalise
        let q_mask = q_mask.reshape([batch, 1, q_len]).expand([batch, c_len, q_len]);
        let c_mask = c_mask.reshape([batch, c_len, 1]).expand([batch, c_len, q_len]);

        let s1 = masked_softmax(s.clone(), q_mask, 2); // attend context → query
        let s2 = masked_softmax(s, c_mask, 1);         // attend query → context

        // a: context-to-query summary, b: query-to-context summary
        // re-projected through the context-to-query weights
        let a = s1.clone().matmul(q);                        // [batch, c_len, H]
        let b = s1.matmul(s2.swap_dims(1, 2)).matmul(c.clone()); // [batch, c_len, H]

        Ok(Tensor::cat(
            vec![c.clone(), a.clone(), c.clone() * a, c * b],
            2,
        )) // [batch, c_len, 4·H]
    }

    /// Trilinear similarity matrix, internal to this layer.
    /// Dropout regularises the inputs to the scoring only; the fusion
    /// above always sees the clean c and q.
    fn similarity(&self, c: Tensor<B, 3>, q: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch, c_len, _] = c.dims();
        let q_len = q.dims()[1];

        let c = self.dropout.forward(c);
        let q = self.dropout.forward(q);

        // Shapes: each term broadcasts to [batch, c_len, q_len]
        let s0 = c.clone()
            .matmul(self.c_weight.val().unsqueeze::<3>())   // [batch, c_len, 1]
            .expand([batch, c_len, q_len]);
        let s1 = q.clone()
            .matmul(self.q_weight.val().unsqueeze::<3>())   // [batch, q_len, 1]
            .swap_dims(1, 2)                                // [batch, 1, q_len]
            .expand([batch, c_len, q_len]);
        let s2 = (c * self.cq_weight.val()).matmul(q.swap_dims(1, 2));

        s0 + s1 + s2 + self.bias.val().reshape([1, 1, 1])
    }
}
