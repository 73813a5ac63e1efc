// ============================================================
// Layer 3 — Utterance Domain Types
// ============================================================
// A corpus is a set of videos, each cut into segments
// (utterances). Every modality provides, per segment, a
// sequence of timed feature vectors:
//
//   video "2iD-tVS8NPw"
//     └── segment "3"
//           ├── embeddings: [(0.00, 0.31, [300 floats]), ...]
//           ├── covarep:    [(0.00, 0.01, [74 floats]),  ...]
//           └── facet:      [(0.00, 0.03, [46 floats]),  ...]
//
// Reference: Rust Book §5 (Structs), §6 (Enums)

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

// ─── Modality ─────────────────────────────────────────────────────────────────
/// One input channel of the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    /// Word embeddings
    Text,
    /// COVAREP acoustic descriptors
    Audio,
    /// FACET facial expression features
    Visual,
}

impl Modality {
    /// Order in which modalities are concatenated by early fusion.
    pub const FUSION_ORDER: [Modality; 3] = [Modality::Visual, Modality::Audio, Modality::Text];

    /// Name of the feature stream in the corpus directory.
    pub fn source_name(self) -> &'static str {
        match self {
            Modality::Text   => "embeddings",
            Modality::Audio  => "covarep",
            Modality::Visual => "facet",
        }
    }

    /// Acoustic and facial features are max-abs scaled; embeddings are used as-is.
    pub fn is_normalized(self) -> bool {
        !matches!(self, Modality::Text)
    }

    /// Sort and deduplicate a user selection into fusion order.
    pub fn in_fusion_order(selected: &[Modality]) -> Vec<Modality> {
        Self::FUSION_ORDER
            .into_iter()
            .filter(|m| selected.contains(m))
            .collect()
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Modality::Text   => "text",
            Modality::Audio  => "audio",
            Modality::Visual => "visual",
        };
        f.write_str(name)
    }
}

impl FromStr for Modality {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "embeddings"   => Ok(Modality::Text),
            "audio" | "covarep"     => Ok(Modality::Audio),
            "visual" | "facet"      => Ok(Modality::Visual),
            other => bail!("unknown modality '{other}' (expected text, audio or visual)"),
        }
    }
}

// ─── UtteranceId ──────────────────────────────────────────────────────────────
/// (video, segment) pair identifying one utterance.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UtteranceId {
    pub video:   String,
    pub segment: String,
}

impl UtteranceId {
    pub fn new(video: impl Into<String>, segment: impl Into<String>) -> Self {
        Self { video: video.into(), segment: segment.into() }
    }
}

impl fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.video, self.segment)
    }
}

// ─── FeatureStep ──────────────────────────────────────────────────────────────
/// One timed feature vector: `[start, end, [values...]]` on disk.
///
/// Missing values are stored as `null` and read back as NaN, which the
/// normaliser later zeroes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawStep", into = "RawStep")]
pub struct FeatureStep {
    pub start:  f64,
    pub end:    f64,
    pub values: Vec<f32>,
}

impl FeatureStep {
    pub fn new(start: f64, end: f64, values: Vec<f32>) -> Self {
        Self { start, end, values }
    }

    pub fn dim(&self) -> usize {
        self.values.len()
    }
}

#[derive(Serialize, Deserialize)]
struct RawStep(f64, f64, Vec<Option<f32>>);

impl From<RawStep> for FeatureStep {
    fn from(raw: RawStep) -> Self {
        let values = raw.2.into_iter().map(|v| v.unwrap_or(f32::NAN)).collect();
        FeatureStep { start: raw.0, end: raw.1, values }
    }
}

impl From<FeatureStep> for RawStep {
    fn from(step: FeatureStep) -> Self {
        let values = step
            .values
            .into_iter()
            .map(|v| if v.is_finite() { Some(v) } else { None })
            .collect();
        RawStep(step.start, step.end, values)
    }
}

/// segment id → timed feature sequence
pub type SegmentStreams = BTreeMap<String, Vec<FeatureStep>>;

/// video id → segments of one modality
pub type FeatureStreams = BTreeMap<String, SegmentStreams>;

/// video id → segment id → continuous sentiment score
pub type SentimentTable = BTreeMap<String, BTreeMap<String, f32>>;

// ─── Partition ────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    Train,
    Valid,
    Test,
}

impl Partition {
    pub const ALL: [Partition; 3] = [Partition::Train, Partition::Valid, Partition::Test];
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Partition::Train => "train",
            Partition::Valid => "validation",
            Partition::Test  => "test",
        };
        f.write_str(name)
    }
}

/// Fixed video-level train / validation / test split.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Splits {
    pub train: Vec<String>,
    pub valid: Vec<String>,
    pub test:  Vec<String>,
}

impl Splits {
    pub fn videos(&self, partition: Partition) -> &[String] {
        match partition {
            Partition::Train => &self.train,
            Partition::Valid => &self.valid,
            Partition::Test  => &self.test,
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_modality_aliases() {
        assert_eq!("text".parse::<Modality>().unwrap(), Modality::Text);
        assert_eq!("COVAREP".parse::<Modality>().unwrap(), Modality::Audio);
        assert_eq!(" facet ".parse::<Modality>().unwrap(), Modality::Visual);
        assert!("smell".parse::<Modality>().is_err());
    }

    #[test]
    fn test_fusion_order_is_visual_audio_text() {
        let order = Modality::in_fusion_order(&[Modality::Text, Modality::Visual, Modality::Audio]);
        assert_eq!(order, vec![Modality::Visual, Modality::Audio, Modality::Text]);
    }

    #[test]
    fn test_fusion_order_drops_duplicates() {
        let order = Modality::in_fusion_order(&[Modality::Audio, Modality::Audio]);
        assert_eq!(order, vec![Modality::Audio]);
    }

    #[test]
    fn test_feature_step_reads_null_as_nan() {
        let step: FeatureStep = serde_json::from_str("[0.5, 1.0, [1.0, null, -2.0]]").unwrap();
        assert_eq!(step.start, 0.5);
        assert_eq!(step.end, 1.0);
        assert_eq!(step.values[0], 1.0);
        assert!(step.values[1].is_nan());
        assert_eq!(step.values[2], -2.0);
    }

    #[test]
    fn test_feature_step_writes_tuple_form() {
        let step = FeatureStep::new(0.0, 0.25, vec![1.5, f32::NAN]);
        let json = serde_json::to_string(&step).unwrap();
        assert_eq!(json, "[0.0,0.25,[1.5,null]]");
    }
}
