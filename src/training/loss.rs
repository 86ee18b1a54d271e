use burn::prelude::*;
use burn::tensor::activation::log_softmax;

/// Cross-entropy between raw logits `[N, K]` and target distributions `[N, K]`.
///
/// Targets may be one-hot or any per-row distribution. Returns a one-element
/// tensor holding the batch mean.
pub fn cross_entropy<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
    let log_probs = log_softmax(logits, 1);
    (targets * log_probs).sum_dim(1).mean().neg()
}
