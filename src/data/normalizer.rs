// ============================================================
// Layer 4 — Max-Abs Feature Normaliser
// ============================================================
// Acoustic and facial descriptors live on wildly different
// scales. Each channel is divided by the largest absolute
// value that channel takes anywhere in the TRAINING partition
// (over all utterances and all time steps):
//
//   divisor[d] = max_{n, t} |train[n][t][d]|
//   x[n][t][d] = x[n][t][d] / divisor[d]
//
// Validation and test data reuse the training divisors, so
// their values may fall outside [-1, 1].
//
// Channels that are all zero in training keep divisor 1.
// Any NaN left after the division (missing inputs, inf/inf)
// is replaced with 0.
//
// The fitted divisors are saved next to the checkpoint so
// `predict` scales new data identically.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::data::padding::PaddedSequence;
use crate::domain::utterance::Modality;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaxAbsNormalizer {
    divisors: Vec<f32>,
}

impl MaxAbsNormalizer {
    /// Learn per-channel divisors from the training sequences.
    pub fn fit(train: &[PaddedSequence]) -> Result<Self> {
        let Some(first) = train.first() else {
            bail!("cannot fit a normaliser on an empty training set");
        };
        let dim = first.dim();
        let mut max_abs = vec![0.0f32; dim];

        for seq in train {
            if seq.dim() != dim {
                bail!("feature width mismatch: {} vs {dim}", seq.dim());
            }
            for row in seq.rows() {
                for (m, &v) in max_abs.iter_mut().zip(row) {
                    // f32::max ignores NaN operands
                    *m = m.max(v.abs());
                }
            }
        }

        let divisors = max_abs
            .into_iter()
            .map(|m| if m == 0.0 { 1.0 } else { m })
            .collect();
        Ok(Self { divisors })
    }

    pub fn divisors(&self) -> &[f32] {
        &self.divisors
    }

    pub fn dim(&self) -> usize {
        self.divisors.len()
    }

    /// Scale one sequence in place and zero every NaN.
    pub fn transform(&self, seq: &mut PaddedSequence) -> Result<()> {
        if seq.dim() != self.dim() {
            bail!(
                "normaliser was fitted on {} channels but sequence has {}",
                self.dim(),
                seq.dim()
            );
        }
        let dim = self.dim().max(1);
        for row in seq.values_mut().chunks_exact_mut(dim) {
            for (v, &d) in row.iter_mut().zip(&self.divisors) {
                let scaled = *v / d;
                *v = if scaled.is_nan() { 0.0 } else { scaled };
            }
        }
        Ok(())
    }

    pub fn transform_all(&self, seqs: &mut [PaddedSequence]) -> Result<()> {
        seqs.iter_mut().try_for_each(|s| self.transform(s))
    }
}

/// Fitted normalisers for every scaled modality of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModalityNormalizers(BTreeMap<Modality, MaxAbsNormalizer>);

impl ModalityNormalizers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, modality: Modality, normalizer: MaxAbsNormalizer) {
        self.0.insert(modality, normalizer);
    }

    pub fn get(&self, modality: Modality) -> Option<&MaxAbsNormalizer> {
        self.0.get(&modality)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
