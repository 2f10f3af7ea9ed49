// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains ALL Burn framework specific code.
// The domain layer stays free of tensors; the application
// layer only calls into runner.rs.
//
// What's in this layer, leaf-first:
//
//   masking.rs    — Length masks and per-length reversal on
//                   id tensors
//
//   embedding.rs  — Token id → dense vector table with range
//                   checking
//
//   lstm.rs       — LSTM cell, stacked recurrence with
//                   optional residual connections, masked
//                   unrolling in either time direction
//
//   encoder.rs    — Reverse → embed → (bi)directional stacks;
//                   emits per-step outputs or a summary state
//
//   attention.rs  — Luong / Bahdanau scoring with padding
//                   masks, plus the wrapper that mixes cell
//                   output and context
//
//   decoder.rs    — Teacher-forced decoding loop with an
//                   attention-augmented LSTM cell
//
//   seq2seq.rs    — Binds encoder and decoder, checks that
//                   their attention flags agree
//
//   runner.rs     — Picks a backend, seeds it, builds the
//                   model and summarises one forward pass
//
// Reference: Burn Book §3 (Building Blocks)
//            Sutskever et al. (2014) Sequence to Sequence Learning
//            Luong et al. (2015), Bahdanau et al. (2015)

/// Length masks and reversal helpers
pub mod masking;

/// Token embedding table
pub mod embedding;

/// LSTM cell and stacked recurrence
pub mod lstm;

/// Variable-length (bi)directional encoder
pub mod encoder;

/// Attention mechanisms and the attention wrapper
pub mod attention;

/// Attention decoder with teacher forcing
pub mod decoder;

/// Encoder + decoder pair
pub mod seq2seq;

/// Backend selection and forward-pass summary
pub mod runner;
