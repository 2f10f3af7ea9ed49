// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// SequencePreprocessor is the hook the Seq2Seq wrapper runs on
// both the source and the target batch before they become
// tensors. It is the reserved place for id normalisation
// (e.g. remapping out-of-vocabulary ids to an UNK id).
//
// Implementations:
//   - Passthrough → leaves the batch untouched (the default)
//   - (future) a vocabulary-aware normaliser
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use crate::domain::{error::Result, sequence::SequenceBatch};

// ─── SequencePreprocessor ─────────────────────────────────────────────────────
/// Transforms a host-side batch before it is handed to the model.
pub trait SequencePreprocessor {
    fn preprocess(&self, batch: SequenceBatch) -> Result<SequenceBatch>;
}

/// Identity preprocessing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl SequencePreprocessor for Passthrough {
    fn preprocess(&self, batch: SequenceBatch) -> Result<SequenceBatch> {
        Ok(batch)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough_is_identity() {
        let batch = SequenceBatch::new(vec![vec![1, 2, 0]], vec![2]).unwrap();
        assert_eq!(Passthrough.preprocess(batch.clone()).unwrap(), batch);
    }
}
