// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer loads a corpus through `FeatureSource`
// without knowing how or where it is stored.
//
// Implementations:
//   - JsonCorpus → a directory of JSON files (data::loader)
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::utterance::{FeatureStreams, Modality, SentimentTable, Splits};

// ─── FeatureSource ────────────────────────────────────────────────────────────
/// Anything that can provide a multimodal sentiment corpus.
pub trait FeatureSource {
    /// Timed feature sequences of one modality for every utterance.
    fn load_streams(&self, modality: Modality) -> Result<FeatureStreams>;

    /// Continuous sentiment score for every utterance.
    fn load_sentiments(&self) -> Result<SentimentTable>;

    /// Video ids of the fixed train / validation / test partitions.
    fn load_splits(&self) -> Result<Splits>;
}
