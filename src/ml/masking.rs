// ============================================================
// Layer 5 — Length Masks and Reversal on Tensors
// ============================================================
// Tensor-side helpers shared by the encoder, the recurrent
// stack and attention:
//
//   ids_tensor      SequenceBatch → [batch, time] Int tensor
//   length_mask     lengths → [batch, time] float, 1 = valid
//   reverse_padded  reverse each row up to its own length
//
// Masks are built on the host from the lengths and uploaded
// once per forward pass.

use burn::prelude::*;

use crate::domain::{
    error::Result,
    sequence::{reversal_indices, validate_lengths, SequenceBatch},
};

/// Upload a host batch as a `[batch, max_time]` Int tensor after
/// checking every id against `vocab_size`.
pub fn ids_tensor<B: Backend>(
    batch:      &SequenceBatch,
    vocab_size: usize,
    device:     &B::Device,
) -> Result<Tensor<B, 2, Int>> {
    let ids = batch.checked_ids(vocab_size)?;
    Ok(Tensor::<B, 1, Int>::from_ints(ids.as_slice(), device)
        .reshape([batch.batch_size(), batch.max_time()]))
}

/// `[batch, max_time]` mask with 1.0 at valid positions and 0.0 at padding.
pub fn length_mask<B: Backend>(
    lengths:  &[usize],
    max_time: usize,
    device:   &B::Device,
) -> Tensor<B, 2> {
    let flat: Vec<f32> = lengths
        .iter()
        .flat_map(|&length| (0..max_time).map(move |t| if t < length { 1.0 } else { 0.0 }))
        .collect();

    Tensor::<B, 1>::from_floats(flat.as_slice(), device).reshape([lengths.len(), max_time])
}

/// Reverse every row of `ids` up to its valid length; padding stays put.
///
///   [[1, 2, 3, 0],      [[3, 2, 1, 0],
///    [4, 5, 6, 7]]  →    [7, 6, 5, 4]]
pub fn reverse_padded<B: Backend>(
    ids:     Tensor<B, 2, Int>,
    lengths: &[usize],
) -> Result<Tensor<B, 2, Int>> {
    let [batch_size, max_time] = ids.dims();
    validate_lengths(lengths, batch_size, max_time)?;

    let index: Vec<i32> = reversal_indices(lengths, max_time)
        .into_iter()
        .map(|t| t as i32)
        .collect();
    let index = Tensor::<B, 1, Int>::from_ints(index.as_slice(), &ids.device())
        .reshape([batch_size, max_time]);

    Ok(ids.gather(1, index))
}
