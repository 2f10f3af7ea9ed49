// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs, enums and traits that define the core
// concepts of the system.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §6 (Enums), §10 (Traits)

/// Error taxonomy and the crate `Result` alias
pub mod error;

/// Cell type and attention variant selectors
pub mod kinds;

/// Token id batches, valid lengths, per-length reversal
pub mod sequence;

/// Preprocessing hook run before tensor conversion
pub mod traits;
