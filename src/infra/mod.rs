// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// File-system concerns used by more than one other layer:
//
//   config_store.rs — Model hyperparameters as JSON
//                     Saves Seq2SeqConfig so a run can be
//                     repeated with the same architecture,
//                     and validates it on the way back in.
//
//   report.rs       — Forward-pass report
//                     Shape, value range and alignment sanity
//                     of one run, written as pretty JSON.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// Seq2SeqConfig JSON persistence
pub mod config_store;

/// Forward-pass report and its JSON writer
pub mod report;
