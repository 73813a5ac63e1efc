// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types that name the concepts of the system:
// modalities, utterances, sentiment labels and partitions.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §6 (Enums), §10 (Traits)

// Modalities, utterance ids, feature steps and partitions
pub mod utterance;

// Valence → polarity / intensity label derivation
pub mod sentiment;

// Core abstractions (traits) that other layers implement
pub mod traits;
