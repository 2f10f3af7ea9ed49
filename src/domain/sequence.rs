// ============================================================
// Layer 3 — Token Sequences and Valid Lengths
// ============================================================
// A batch of token id rows padded to one width, plus the
// number of real tokens in each row. Everything past a row's
// valid length is padding and must never leak into outputs.
//
// Example (max_time = 5, pad = 0):
//   ids     = [[7, 3, 9, 0, 0],
//              [4, 4, 1, 2, 8]]
//   lengths = [3, 5]
//
// Also home to the pure index arithmetic for reversing each
// row up to its own length:
//   [7, 3, 9, 0, 0] → [9, 3, 7, 0, 0]
//
// Reference: Rust Book §8 (Vectors)

use serde::{Deserialize, Serialize};

use crate::domain::error::{Result, Seq2SeqError};

/// Check that there is one length per row and `0 < length <= max_time`.
pub fn validate_lengths(lengths: &[usize], batch_size: usize, max_time: usize) -> Result<()> {
    if batch_size == 0 {
        return Err(Seq2SeqError::EmptyBatch);
    }
    if lengths.len() != batch_size {
        return Err(Seq2SeqError::BatchMismatch {
            expected: batch_size,
            actual:   lengths.len(),
        });
    }
    for (index, &length) in lengths.iter().enumerate() {
        if length == 0 {
            return Err(Seq2SeqError::EmptySequence { index });
        }
        if length > max_time {
            return Err(Seq2SeqError::LengthOutOfRange { index, length, max_time });
        }
    }
    Ok(())
}

/// Time index each position reads from after reversing its row
/// up to the row's valid length. Flattened row-major, `lengths.len() * max_time`.
///
/// Padding positions map to themselves.
pub fn reversal_indices(lengths: &[usize], max_time: usize) -> Vec<usize> {
    lengths
        .iter()
        .flat_map(|&length| {
            (0..max_time).map(move |t| if t < length { length - 1 - t } else { t })
        })
        .collect()
}

// ─── SequenceBatch ────────────────────────────────────────────────────────────
/// Rectangular batch of token ids with per-row valid lengths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceBatch {
    ids:     Vec<Vec<u32>>,
    lengths: Vec<usize>,
}

impl SequenceBatch {
    /// Build from already padded rows and their valid lengths.
    pub fn new(ids: Vec<Vec<u32>>, lengths: Vec<usize>) -> Result<Self> {
        let max_time = ids.first().map(Vec::len).unwrap_or(0);

        if let Some(row) = ids.iter().find(|row| row.len() != max_time) {
            return Err(Seq2SeqError::ShapeMismatch {
                what:     "token id row",
                expected: vec![max_time],
                actual:   vec![row.len()],
            });
        }
        validate_lengths(&lengths, ids.len(), max_time)?;

        Ok(Self { ids, lengths })
    }

    /// Build from unpadded rows; every row is padded with `pad_id`
    /// to the longest one and its length recorded.
    pub fn from_sequences(sequences: Vec<Vec<u32>>, pad_id: u32) -> Result<Self> {
        let max_time = sequences.iter().map(Vec::len).max().unwrap_or(0);
        let lengths  = sequences.iter().map(Vec::len).collect();
        let ids = sequences
            .into_iter()
            .map(|mut row| {
                row.resize(max_time, pad_id);
                row
            })
            .collect();
        Self::new(ids, lengths)
    }

    pub fn ids(&self) -> &[Vec<u32>] {
        &self.ids
    }

    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    pub fn batch_size(&self) -> usize {
        self.ids.len()
    }

    /// Padded width of the batch.
    pub fn max_time(&self) -> usize {
        self.ids.first().map(Vec::len).unwrap_or(0)
    }

    /// Row-major ids as i32, the layout Burn's Int tensors are built from.
    /// Every id, padding included, must lie in `[0, vocab_size)`.
    pub fn checked_ids(&self, vocab_size: usize) -> Result<Vec<i32>> {
        self.ids
            .iter()
            .flatten()
            .map(|&id| match i32::try_from(id) {
                Ok(narrow) if (id as usize) < vocab_size => Ok(narrow),
                _ => Err(Seq2SeqError::TokenOutOfRange { id: i64::from(id), vocab_size }),
            })
            .collect()
    }
}
