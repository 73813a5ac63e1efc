// ============================================================
// Layer 4 — Sequence Padding / Truncation
// ============================================================
// Every utterance is cut or padded to exactly `max_len` steps
// so a batch can be stacked into one [batch, max_len, dim]
// tensor.
//
//   shorter (len 3, max_len 5):   0  0  x0 x1 x2
//   longer  (len 7, max_len 5):   x2 x3 x4 x5 x6
//
// Padding goes in FRONT so the recurrent layer always ends on
// real data; truncation keeps the MOST RECENT steps.
//
// Reference: Rust Book §8 (Vectors), §9 (Error Handling)

use anyhow::{bail, Result};

use crate::domain::utterance::FeatureStep;

/// A fixed-length feature sequence stored row-major:
/// `values[t * dim + d]` is channel `d` at step `t`.
#[derive(Debug, Clone, PartialEq)]
pub struct PaddedSequence {
    steps:  usize,
    dim:    usize,
    values: Vec<f32>,
}

impl PaddedSequence {
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self> {
        let dim = rows.first().map(Vec::len).unwrap_or(0);
        let mut values = Vec::with_capacity(rows.len() * dim);
        for (t, row) in rows.iter().enumerate() {
            if row.len() != dim {
                bail!("ragged sequence: step {t} has {} values, expected {dim}", row.len());
            }
            values.extend_from_slice(row);
        }
        Ok(Self { steps: rows.len(), dim, values })
    }

    pub fn steps(&self) -> usize { self.steps }

    pub fn dim(&self) -> usize { self.dim }

    pub fn values(&self) -> &[f32] { &self.values }

    pub fn values_mut(&mut self) -> &mut [f32] { &mut self.values }

    pub fn into_values(self) -> Vec<f32> { self.values }

    pub fn row(&self, t: usize) -> &[f32] {
        &self.values[t * self.dim..(t + 1) * self.dim]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        // chunks_exact panics on 0
        self.values.chunks_exact(self.dim.max(1)).take(self.steps)
    }
}

/// Pad with leading zero rows or keep the last `max_len` rows.
///
/// Fails on an empty input (its width is unknown) and on
/// steps of different widths.
pub fn pad(sequence: &[FeatureStep], max_len: usize) -> Result<PaddedSequence> {
    let Some(first) = sequence.first() else {
        bail!("cannot pad an empty sequence");
    };
    let dim = first.dim();

    let kept = &sequence[sequence.len().saturating_sub(max_len)..];
    let pad_rows = max_len - kept.len();

    let mut values = vec![0.0f32; max_len * dim];
    for (i, step) in kept.iter().enumerate() {
        if step.dim() != dim {
            bail!("ragged sequence: step has {} values, expected {dim}", step.dim());
        }
        let t = pad_rows + i;
        values[t * dim..(t + 1) * dim].copy_from_slice(&step.values);
    }

    Ok(PaddedSequence { steps: max_len, dim, values })
}
