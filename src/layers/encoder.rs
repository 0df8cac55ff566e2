// ============================================================
// Sequence Encoder (bidirectional, packed)
// ============================================================
// Encodes a padded batch of feature sequences with a
// bidirectional recurrent cell, doubling the feature width.
//
// Why packing?
//   Naively running a recurrence over padding corrupts the
//   outputs of every shorter sequence: the forward pass is safe
//   (padding trails the real tokens) but the backward pass would
//   start from garbage. The fix is the classic pack procedure:
//
//   1. sort the batch by descending true length
//   2. at time step t only sequences with length > t are active;
//      after the sort the active set is a contiguous prefix, so
//      each step slices that prefix and the recurrence never
//      touches a padding position
//   3. step the cell (ascending t forward, descending t backward;
//      a sequence joins the backward recurrence at its own last
//      real position, starting from a zero state)
//   4. outputs land in a zero tensor of the original padded
//      shape, so trailing positions come back as exact zeros
//   5. invert the sort to restore the original batch order
//
// Burn has no packed-sequence support and its built-in recurrent
// modules cannot skip padding, so the cells live here as explicit
// gate projections with a `step` function. The cell family is
// chosen once at construction (RnnType → RecurrentCell enum); the
// packing contract is identical for every family.

use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig};
use burn::prelude::*;
use burn::tensor::activation;

use crate::config::RnnType;
use crate::error::ModelError;

// ─── Recurrent cells ──────────────────────────────────────────────────────────

/// One LSTM step. Gate pre-activations are computed as a single
/// fused projection per source and sliced apart: [i | f | g | o].
#[derive(Module, Debug)]
pub struct LstmCell<B: Backend> {
    input_proj:  Linear<B>, // input_size  → 4·hidden, with bias
    hidden_proj: Linear<B>, // hidden_size → 4·hidden
    hidden_size: usize,
}

impl<B: Backend> LstmCell<B> {
    fn new(input_size: usize, hidden_size: usize, device: &B::Device) -> Self {
        Self {
            input_proj:  LinearConfig::new(input_size, 4 * hidden_size).init(device),
            hidden_proj: LinearConfig::new(hidden_size, 4 * hidden_size)
                .with_bias(false)
                .init(device),
            hidden_size,
        }
    }

    fn step(
        &self,
        x: Tensor<B, 2>,
        h: Tensor<B, 2>,
        c: Tensor<B, 2>,
    ) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let k  = x.dims()[0];
        let hs = self.hidden_size;
        let gates = self.input_proj.forward(x) + self.hidden_proj.forward(h);

        let i = activation::sigmoid(gates.clone().slice([0..k, 0..hs]));
        let f = activation::sigmoid(gates.clone().slice([0..k, hs..2 * hs]));
        let g = activation::tanh(gates.clone().slice([0..k, 2 * hs..3 * hs]));
        let o = activation::sigmoid(gates.slice([0..k, 3 * hs..4 * hs]));

        let c_next = f * c + i * g;
        let h_next = o * activation::tanh(c_next.clone());
        (h_next, c_next)
    }
}

/// One GRU step: [r | z | n] gate layout.
#[derive(Module, Debug)]
pub struct GruCell<B: Backend> {
    input_proj:  Linear<B>, // input_size  → 3·hidden, with bias
    hidden_proj: Linear<B>, // hidden_size → 3·hidden
    hidden_size: usize,
}

impl<B: Backend> GruCell<B> {
    fn new(input_size: usize, hidden_size: usize, device: &B::Device) -> Self {
        Self {
            input_proj:  LinearConfig::new(input_size, 3 * hidden_size).init(device),
            hidden_proj: LinearConfig::new(hidden_size, 3 * hidden_size)
                .with_bias(false)
                .init(device),
            hidden_size,
        }
    }

    fn step(&self, x: Tensor<B, 2>, h: Tensor<B, 2>) -> Tensor<B, 2> {
        let k  = x.dims()[0];
        let hs = self.hidden_size;
        let xi = self.input_proj.forward(x);
        let hh = self.hidden_proj.forward(h.clone());

        let r = activation::sigmoid(
            xi.clone().slice([0..k, 0..hs]) + hh.clone().slice([0..k, 0..hs]),
        );
        let z = activation::sigmoid(
            xi.clone().slice([0..k, hs..2 * hs]) + hh.clone().slice([0..k, hs..2 * hs]),
        );
        let n = activation::tanh(
            xi.slice([0..k, 2 * hs..3 * hs]) + r * hh.slice([0..k, 2 * hs..3 * hs]),
        );

        // h' = (1 − z)·n + z·h
        (z.ones_like() - z.clone()) * n + z * h
    }
}

/// One vanilla tanh RNN step.
#[derive(Module, Debug)]
pub struct TanhCell<B: Backend> {
    input_proj:  Linear<B>,
    hidden_proj: Linear<B>,
}

impl<B: Backend> TanhCell<B> {
    fn new(input_size: usize, hidden_size: usize, device: &B::Device) -> Self {
        Self {
            input_proj:  LinearConfig::new(input_size, hidden_size).init(device),
            hidden_proj: LinearConfig::new(hidden_size, hidden_size)
                .with_bias(false)
                .init(device),
        }
    }

    fn step(&self, x: Tensor<B, 2>, h: Tensor<B, 2>) -> Tensor<B, 2> {
        activation::tanh(self.input_proj.forward(x) + self.hidden_proj.forward(h))
    }
}

/// Cell dispatch, fixed at construction. Every variant shares the
/// (x_t, h, c) → (h', c') step contract; GRU and the vanilla cell
/// simply carry the unused cell state through untouched.
#[derive(Module, Debug)]
pub enum RecurrentCell<B: Backend> {
    Lstm(LstmCell<B>),
    Gru(GruCell<B>),
    Tanh(TanhCell<B>),
}

impl<B: Backend> RecurrentCell<B> {
    fn new(rnn_type: RnnType, input_size: usize, hidden_size: usize, device: &B::Device) -> Self {
        match rnn_type {
            RnnType::Lstm => RecurrentCell::Lstm(LstmCell::new(input_size, hidden_size, device)),
            RnnType::Gru  => RecurrentCell::Gru(GruCell::new(input_size, hidden_size, device)),
            RnnType::Tanh => RecurrentCell::Tanh(TanhCell::new(input_size, hidden_size, device)),
        }
    }

    fn step(
        &self,
        x: Tensor<B, 2>,
        h: Tensor<B, 2>,
        c: Tensor<B, 2>,
    ) -> (Tensor<B, 2>, Tensor<B, 2>) {
        match self {
            RecurrentCell::Lstm(cell) => cell.step(x, h, c),
            RecurrentCell::Gru(cell)  => (cell.step(x, h), c),
            RecurrentCell::Tanh(cell) => (cell.step(x, h), c),
        }
    }
}

// ─── Encoder ──────────────────────────────────────────────────────────────────

#[derive(Config, Debug)]
pub struct SequenceEncoderConfig {
    pub input_size:  usize,
    pub hidden_size: usize,
    #[config(default = 1)]
    pub num_layers:  usize,
    #[config(default = "RnnType::Lstm")]
    pub rnn_type:    RnnType,
    #[config(default = 0.0)]
    pub drop_prob:   f64,
}

impl SequenceEncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SequenceEncoder<B> {
        // Layer 0 consumes the raw input; deeper layers consume the
        // 2·hidden forward/backward concatenation of the layer below.
        let layers = (0..self.num_layers)
            .map(|l| {
                let in_size = if l == 0 { self.input_size } else { 2 * self.hidden_size };
                BiRecurrentLayer {
                    fwd: RecurrentCell::new(self.rnn_type, in_size, self.hidden_size, device),
                    bwd: RecurrentCell::new(self.rnn_type, in_size, self.hidden_size, device),
                }
            })
            .collect();
        SequenceEncoder {
            layers,
            dropout:     DropoutConfig::new(self.drop_prob).init(),
            input_size:  self.input_size,
            hidden_size: self.hidden_size,
        }
    }
}

#[derive(Module, Debug)]
struct BiRecurrentLayer<B: Backend> {
    fwd: RecurrentCell<B>,
    bwd: RecurrentCell<B>,
}

#[derive(Module, Debug)]
pub struct SequenceEncoder<B: Backend> {
    layers:      Vec<BiRecurrentLayer<B>>,
    dropout:     Dropout,
    input_size:  usize,
    hidden_size: usize,
}

impl<B: Backend> SequenceEncoder<B> {
    /// x: [batch, seq_len, input_size], lengths: true length per row
    /// → [batch, seq_len, 2·hidden_size], padding positions exactly zero.
    pub fn forward(
        &self,
        x: Tensor<B, 3>,
        lengths: &[usize],
    ) -> Result<Tensor<B, 3>, ModelError> {
        let [batch, seq_len, input_size] = x.dims();
        let device = x.device();

        if lengths.len() != batch {
            return Err(ModelError::shape(
                "sequence encoder: lengths vs batch",
                format!("{batch} lengths"),
                lengths.len(),
            ));
        }
        if input_size != self.input_size {
            return Err(ModelError::shape(
                "sequence encoder: input feature width",
                self.input_size,
                input_size,
            ));
        }
        for (index, &len) in lengths.iter().enumerate() {
            if len == 0 {
                return Err(ModelError::EmptySequence { index });
            }
            if len > seq_len {
                return Err(ModelError::shape(
                    "sequence encoder: length vs padded size",
                    format!("length <= {seq_len}"),
                    len,
                ));
            }
        }

        // (1) sort by descending length so the active set at any time
        // step is a contiguous batch prefix
        let mut order: Vec<usize> = (0..batch).collect();
        order.sort_by_key(|&i| std::cmp::Reverse(lengths[i]));
        let sorted_lens: Vec<usize> = order.iter().map(|&i| lengths[i]).collect();

        let sort_idx: Vec<i32> = order.iter().map(|&i| i as i32).collect();
        let sort_idx = Tensor::<B, 1, Int>::from_ints(sort_idx.as_slice(), &device);
        let mut h = x.select(0, sort_idx);

        // (2)–(4) packed bidirectional recurrence, layer by layer
        for (l, layer) in self.layers.iter().enumerate() {
            if l > 0 {
                // Inter-layer dropout, matching stacked-RNN convention
                h = self.dropout.forward(h);
            }
            let fwd = self.run_direction(&layer.fwd, &h, &sorted_lens, false);
            let bwd = self.run_direction(&layer.bwd, &h, &sorted_lens, true);
            h = Tensor::cat(vec![fwd, bwd], 2); // [batch, seq_len, 2·hidden]
        }

        // (5) invert the sort to restore original batch order
        let mut inverse = vec![0i32; batch];
        for (rank, &i) in order.iter().enumerate() {
            inverse[i] = rank as i32;
        }
        let unsort_idx = Tensor::<B, 1, Int>::from_ints(inverse.as_slice(), &device);
        let out = h.select(0, unsort_idx);

        Ok(self.dropout.forward(out))
    }

    /// Run one direction of one layer over a length-sorted batch.
    ///
    /// `sorted_lens` is descending, so the active rows at step t are
    /// exactly the prefix `0..partition_point(len > t)`. Rows outside
    /// the prefix are never read or written; their output stays zero.
    fn run_direction(
        &self,
        cell: &RecurrentCell<B>,
        x: &Tensor<B, 3>,
        sorted_lens: &[usize],
        reverse: bool,
    ) -> Tensor<B, 3> {
        let [batch, seq_len, input_size] = x.dims();
        let hs     = self.hidden_size;
        let device = x.device();

        let mut h   = Tensor::<B, 2>::zeros([batch, hs], &device);
        let mut c   = Tensor::<B, 2>::zeros([batch, hs], &device);
        let mut out = Tensor::<B, 3>::zeros([batch, seq_len, hs], &device);

        let time: Vec<usize> = if reverse {
            (0..seq_len).rev().collect()
        } else {
            (0..seq_len).collect()
        };

        for t in time {
            let active = sorted_lens.partition_point(|&len| len > t);
            if active == 0 {
                continue;
            }

            let x_t = x.clone()
                .slice([0..active, t..t + 1, 0..input_size])
                .reshape([active, input_size]);
            let h_t = h.clone().slice([0..active, 0..hs]);
            let c_t = c.clone().slice([0..active, 0..hs]);

            let (h_next, c_next) = cell.step(x_t, h_t, c_t);

            out = out.slice_assign(
                [0..active, t..t + 1, 0..hs],
                h_next.clone().reshape([active, 1, hs]),
            );
            h = h.slice_assign([0..active, 0..hs], h_next);
            c = c.slice_assign([0..active, 0..hs], c_next);
        }

        out
    }
}
