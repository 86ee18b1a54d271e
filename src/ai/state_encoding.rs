use burn::prelude::*;
use burn::tensor::TensorData;

use crate::data::Batch;

/// Move a batch's board history onto `device` as `[batch, seq_len, size, size]`.
pub fn encode_boards<B: Backend>(batch: &Batch, device: &B::Device) -> Tensor<B, 4> {
    let size = batch.board_size();
    Tensor::<B, 1>::from_data(TensorData::from(batch.boards()), device).reshape([
        batch.len(),
        batch.seq_len(),
        size,
        size,
    ])
}

/// Move a batch's target distributions onto `device` as `[batch, size²]`.
pub fn encode_targets<B: Backend>(batch: &Batch, device: &B::Device) -> Tensor<B, 2> {
    Tensor::<B, 1>::from_data(TensorData::from(batch.targets()), device)
        .reshape([batch.len(), batch.num_classes()])
}
