// ============================================================
// Padding Masks & Masked Softmax
// ============================================================
// Sequences arrive padded to a batch-wide maximum length, with
// token ID 0 reserved for padding. Every statistic computed over
// a sequence must exclude those positions, so this module is the
// single place masks are derived and the single place softmax
// learns about them.
//
// Masked softmax convention (documented, tested):
//   - invalid positions receive *exactly* zero probability mass
//   - a row whose positions are all invalid yields an exact zero
//     vector — never NaN, never uniform
//   - in log space, invalid positions are forced to the sentinel
//     LOG_ZERO (−1e30), i.e. the log of effectively-zero mass
//
// Reference: Seo et al. (2017) Bidirectional Attention Flow

use burn::prelude::*;
use burn::tensor::activation;

/// Raw score assigned to invalid positions before normalisation.
/// Large enough that exp(x - max) underflows to zero against any
/// realistic logit, small enough to stay finite in f32.
const NEG_INF: f64 = -1e30;

/// Sentinel log-probability reported for masked positions.
pub const LOG_ZERO: f64 = -1e30;

/// Derive the padding mask from a batch of token indices:
/// true where the position holds a real token (ID != 0).
///
/// All masks in the crate come from this one derivation so the
/// index-zero convention cannot drift between layers.
pub fn padding_mask<B: Backend>(idxs: &Tensor<B, 2, Int>) -> Tensor<B, 2, Bool> {
    idxs.clone().not_equal_elem(0)
}

/// True (unpadded) length of each sequence in a padded batch,
/// i.e. the per-row count of valid positions.
pub fn mask_lengths<B: Backend>(mask: &Tensor<B, 2, Bool>) -> Vec<usize> {
    mask.clone()
        .int()
        .sum_dim(1)
        .into_data()
        .iter::<i64>()
        .map(|l| l as usize)
        .collect()
}

/// Softmax over `dim` restricted to positions where `mask` is true.
///
/// `mask` must already be broadcast to the shape of `logits`.
/// Invalid positions contribute nothing to the normaliser and come
/// back as exact zeros; an all-invalid row is an exact zero vector.
pub fn masked_softmax<B: Backend, const D: usize>(
    logits: Tensor<B, D>,
    mask: Tensor<B, D, Bool>,
    dim: usize,
) -> Tensor<B, D> {
    let invalid = mask.bool_not();
    let probs   = activation::softmax(logits.mask_fill(invalid.clone(), NEG_INF), dim);
    // An all-invalid row survives the softmax as a uniform distribution
    // (every score tied at NEG_INF); the final fill collapses it to zeros.
    probs.mask_fill(invalid, 0.0)
}

/// Log-softmax over `dim` restricted to positions where `mask` is true.
///
/// Invalid positions are reported as `LOG_ZERO`; an all-invalid row is
/// all `LOG_ZERO`. Valid positions form a proper log-distribution.
pub fn masked_log_softmax<B: Backend, const D: usize>(
    logits: Tensor<B, D>,
    mask: Tensor<B, D, Bool>,
    dim: usize,
) -> Tensor<B, D> {
    let invalid = mask.bool_not();
    let log_p   = activation::log_softmax(logits.mask_fill(invalid.clone(), NEG_INF), dim);
    log_p.mask_fill(invalid, LOG_ZERO)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    fn device() -> <TestBackend as Backend>::Device {
        Default::default()
    }

    #[test]
    fn test_padding_mask_from_indices() {
        let idxs = Tensor::<TestBackend, 1, Int>::from_ints([5, 3, 0, 0], &device())
            .reshape([1, 4]);
        let mask: Vec<bool> = padding_mask(&idxs).into_data().iter::<bool>().collect();
        assert_eq!(mask, vec![true, true, false, false]);
    }

    #[test]
    fn test_mask_lengths() {
        let idxs = Tensor::<TestBackend, 1, Int>::from_ints(
            [1, 2, 3, 0, 0, 7, 0, 0, 0, 0], &device(),
        ).reshape([2, 5]);
        let mask = padding_mask(&idxs);
        assert_eq!(mask_lengths(&mask), vec![3, 1]);
    }

    #[test]
    fn test_masked_softmax_sums_to_one_over_valid() {
        let logits = Tensor::<TestBackend, 2>::from_floats(
            [[1.0, 2.0, 3.0, 4.0]], &device(),
        );
        let mask = Tensor::<TestBackend, 1, Int>::from_ints([1, 1, 1, 0], &device())
            .reshape([1, 4])
            .not_equal_elem(0);

        let probs: Vec<f32> = masked_softmax(logits, mask, 1)
            .into_data().to_vec().unwrap();

        // Masked position carries exactly zero mass
        assert_eq!(probs[3], 0.0);
        // Valid positions form a distribution
        let total: f32 = probs.iter().sum();
        assert!((total - 1.0).abs() < 1e-5, "sum was {total}");
        // Larger logit, larger probability
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn test_masked_softmax_all_invalid_row_is_zero_vector() {
        let logits = Tensor::<TestBackend, 2>::from_floats(
            [[10.0, -3.0, 0.5], [1.0, 1.0, 1.0]], &device(),
        );
        // First row fully masked, second row fully valid
        let mask = Tensor::<TestBackend, 1, Int>::from_ints([0, 0, 0, 1, 1, 1], &device())
            .reshape([2, 3])
            .not_equal_elem(0);

        let probs: Vec<f32> = masked_softmax(logits, mask, 1)
            .into_data().to_vec().unwrap();

        assert_eq!(&probs[..3], &[0.0, 0.0, 0.0]);
        for p in &probs {
            assert!(p.is_finite(), "NaN/Inf leaked from degenerate row");
        }
        let second: f32 = probs[3..].iter().sum();
        assert!((second - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_masked_log_softmax_drives_masked_positions_to_log_zero() {
        let logits = Tensor::<TestBackend, 2>::from_floats(
            [[0.3, 0.1, 2.0, -1.0]], &device(),
        );
        let mask = Tensor::<TestBackend, 1, Int>::from_ints([1, 1, 0, 1], &device())
            .reshape([1, 4])
            .not_equal_elem(0);

        let log_p: Vec<f32> = masked_log_softmax(logits, mask, 1)
            .into_data().to_vec().unwrap();

        // Masked position reports effectively-zero mass
        assert!(log_p[2] <= -1e20);
        // Valid positions exponentiate back to a distribution
        let total: f32 = [log_p[0], log_p[1], log_p[3]].iter().map(|l| l.exp()).sum();
        assert!((total - 1.0).abs() < 1e-5, "sum was {total}");
    }

    #[test]
    fn test_masked_log_softmax_all_invalid_row_is_all_sentinel() {
        let logits = Tensor::<TestBackend, 2>::from_floats([[4.0, 5.0]], &device());
        let mask = Tensor::<TestBackend, 1, Int>::from_ints([0, 0], &device())
            .reshape([1, 2])
            .not_equal_elem(0);

        let log_p: Vec<f32> = masked_log_softmax(logits, mask, 1)
            .into_data().to_vec().unwrap();

        for l in &log_p {
            assert!(l.is_finite());
            assert!(*l <= -1e20);
        }
    }
}
