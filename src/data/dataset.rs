use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::data::padding::PaddedSequence;
use crate::domain::sentiment::SentimentLabels;
use crate::domain::utterance::UtteranceId;

/// One fused, padded and normalised utterance with its three targets.
/// `features` is row-major `[steps, dim]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentSample {
    pub id:       UtteranceId,
    pub features: Vec<f32>,
    pub steps:    usize,
    pub dim:      usize,
    pub labels:   SentimentLabels,
}

impl SentimentSample {
    pub fn new(id: UtteranceId, features: PaddedSequence, labels: SentimentLabels) -> Self {
        let steps = features.steps();
        let dim   = features.dim();
        Self { id, features: features.into_values(), steps, dim, labels }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SentimentDataset {
    samples: Vec<SentimentSample>,
}

impl SentimentDataset {
    pub fn new(samples: Vec<SentimentSample>) -> Self { Self { samples } }

    pub fn samples(&self) -> &[SentimentSample] { &self.samples }

    /// Width of the fused feature vector, 0 for an empty set.
    pub fn feature_dim(&self) -> usize {
        self.samples.first().map(|s| s.dim).unwrap_or(0)
    }

    pub fn steps(&self) -> usize {
        self.samples.first().map(|s| s.steps).unwrap_or(0)
    }

    pub fn labels(&self) -> Vec<SentimentLabels> {
        self.samples.iter().map(|s| s.labels).collect()
    }
}

impl Dataset<SentimentSample> for SentimentDataset {
    fn get(&self, index: usize) -> Option<SentimentSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
