// ============================================================
// Layer 4 — Early Fusion
// ============================================================
// Concatenates the per-step feature vectors of several
// modalities into one wide vector per step:
//
//   visual [T, 46] ┐
//   audio  [T, 74] ├─▶ fused [T, 46 + 74 + 300]
//   text   [T, 300]┘
//
// Inputs must already be padded to the same number of steps.

use anyhow::{bail, Result};

use crate::data::padding::PaddedSequence;

pub fn early_fuse(parts: &[&PaddedSequence]) -> Result<PaddedSequence> {
    let Some(first) = parts.first() else {
        bail!("nothing to fuse");
    };
    let steps = first.steps();
    if let Some(bad) = parts.iter().find(|p| p.steps() != steps) {
        bail!("cannot fuse sequences of {} and {} steps", steps, bad.steps());
    }

    let rows: Vec<Vec<f32>> = (0..steps)
        .map(|t| parts.iter().flat_map(|p| p.row(t).iter().copied()).collect())
        .collect();
    PaddedSequence::from_rows(&rows)
}
