// ============================================================
// Layer 3 — Error Taxonomy
// ============================================================
// Every failure the model core can report. Two families:
//
//   Configuration errors — raised while building modules
//     AttentionMismatch, UnsupportedAttention, UnsupportedRnn,
//     InvalidConfig, MissingMemory
//
//   Shape / range errors — raised by the operation that
//     received the bad batch
//     TokenOutOfRange, LengthOutOfRange, EmptySequence,
//     EmptyBatch, BatchMismatch, ShapeMismatch
//
// Nothing here is retried. The computation is deterministic,
// so a failure is always a caller contract violation.
//
// Reference: Rust Book §9 (Recoverable Errors with Result)
//            thiserror crate documentation

use thiserror::Error;

/// Crate-wide result alias for the model core.
pub type Result<T> = std::result::Result<T, Seq2SeqError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Seq2SeqError {
    #[error("attention option needs to sync: encoder add_attention={encoder}, decoder add_attention={decoder}")]
    AttentionMismatch { encoder: bool, decoder: bool },

    #[error("unsupported attention type '{0}' (expected 'luong' or 'bahdanau')")]
    UnsupportedAttention(String),

    #[error("unsupported rnn type '{0}' (expected 'lstm')")]
    UnsupportedRnn(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("decoder attention needs the per-step encoder outputs, got a summary state")]
    MissingMemory,

    #[error("token id {id} is out of range for a vocabulary of {vocab_size}")]
    TokenOutOfRange { id: i64, vocab_size: usize },

    #[error("sequence {index} has length {length} but the batch only has {max_time} time steps")]
    LengthOutOfRange { index: usize, length: usize, max_time: usize },

    #[error("sequence {index} has length 0; every sequence needs at least one step")]
    EmptySequence { index: usize },

    #[error("batch has no sequences")]
    EmptyBatch,

    #[error("batch size mismatch: expected {expected}, got {actual}")]
    BatchMismatch { expected: usize, actual: usize },

    #[error("shape mismatch for {what}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        what:     &'static str,
        expected: Vec<usize>,
        actual:   Vec<usize>,
    },
}

impl Seq2SeqError {
    /// True for errors raised while building modules rather than
    /// while running a forward pass.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::AttentionMismatch { .. }
                | Self::UnsupportedAttention(_)
                | Self::UnsupportedRnn(_)
                | Self::InvalidConfig(_)
                | Self::MissingMemory
        )
    }
}
