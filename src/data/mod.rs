// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between the JSON corpus on disk and the tensor
// batches fed to the model:
//
//   JsonCorpus        → per-modality timed feature streams
//       │
//       ▼
//   align_streams     → every modality resampled onto words
//       │
//       ▼
//   select_utterances → complete utterances per partition
//       │
//       ▼
//   pad               → fixed max_len steps per modality
//       │
//       ▼
//   MaxAbsNormalizer  → audio / visual scaled by train max
//       │
//       ▼
//   early_fuse        → one wide vector per step
//       │
//       ▼
//   SentimentDataset  → Burn Dataset of samples + labels
//       │
//       ▼
//   SentimentBatcher  → [batch, steps, dim] tensors
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads the corpus directory
pub mod loader;

/// Resamples modalities onto the reference timeline
pub mod aligner;

/// Chooses utterances for train / validation / test
pub mod partition;

/// Pads or truncates sequences to a fixed length
pub mod padding;

/// Per-channel max-abs scaling fitted on training data
pub mod normalizer;

/// Input-level concatenation of modalities
pub mod fusion;

/// Implements Burn's Dataset trait for sentiment samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Seeded demo corpus writer
pub mod synthetic;
