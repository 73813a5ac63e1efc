// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Scores a model on one partition:
//
//   loss               weighted multitask objective (sample-weighted
//                      mean over batches)
//   pearson            correlation of predicted vs. true valence
//   mae                mean |predicted - true| valence
//   polarity_accuracy  predicted sign class == true sign class
//   intensity_accuracy argmax class == true bucket
//
// The metric functions work on plain slices so they are usable
// without a model.

use anyhow::{bail, Result};
use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::dataset::SentimentDataset;
use crate::domain::sentiment::SentimentLabels;
use crate::ml::model::{LossWeights, MultitaskModel};
use crate::ml::predictor::{batches, Predictions};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub samples:            usize,
    pub loss:               f64,
    pub valence_loss:       f64,
    pub polarity_loss:      f64,
    pub intensity_loss:     f64,
    pub pearson:            f64,
    pub mae:                f64,
    pub polarity_accuracy:  f64,
    pub intensity_accuracy: f64,
}

/// Run the model over `dataset` and compute losses plus metrics.
pub fn evaluate<B: Backend>(
    model:      &MultitaskModel<B>,
    dataset:    &SentimentDataset,
    batch_size: usize,
    weights:    &LossWeights,
    device:     &B::Device,
) -> Result<(Evaluation, Predictions)> {
    if dataset.samples().is_empty() {
        bail!("cannot evaluate on an empty partition");
    }

    let mut predictions = Predictions::default();
    let mut sums = [0.0f64; 4];

    for batch in batches::<B>(dataset, batch_size, device)? {
        let n      = batch.valence.dims()[0] as f64;
        let output = model.forward(batch.features.clone());
        let loss   = model.loss(&output, &batch, weights);

        for (sum, t) in sums.iter_mut().zip([loss.total, loss.valence, loss.polarity, loss.intensity]) {
            *sum += t.into_scalar().elem::<f64>() * n;
        }
        predictions.extend_from_output(&output)?;
    }

    let labels  = dataset.labels();
    let samples = labels.len() as f64;
    let truth: Vec<f32> = labels.iter().map(|l| l.valence).collect();

    let evaluation = Evaluation {
        samples:            labels.len(),
        loss:               sums[0] / samples,
        valence_loss:       sums[1] / samples,
        polarity_loss:      sums[2] / samples,
        intensity_loss:     sums[3] / samples,
        pearson:            pearson(&predictions.valence, &truth),
        mae:                mean_absolute_error(&predictions.valence, &truth),
        polarity_accuracy:  polarity_accuracy(&predictions, &labels),
        intensity_accuracy: intensity_accuracy(&predictions, &labels),
    };
    Ok((evaluation, predictions))
}

/// Pearson correlation; NaN when either side has zero variance.
pub fn pearson(pred: &[f32], truth: &[f32]) -> f64 {
    let n = pred.len().min(truth.len());
    if n == 0 {
        return f64::NAN;
    }
    let mean = |xs: &[f32]| xs[..n].iter().map(|&x| x as f64).sum::<f64>() / n as f64;
    let (mp, mt) = (mean(pred), mean(truth));

    let (mut cov, mut vp, mut vt) = (0.0, 0.0, 0.0);
    for (&p, &t) in pred.iter().zip(truth) {
        let dp = p as f64 - mp;
        let dt = t as f64 - mt;
        cov += dp * dt;
        vp  += dp * dp;
        vt  += dt * dt;
    }
    if vp == 0.0 || vt == 0.0 {
        return f64::NAN;
    }
    cov / (vp.sqrt() * vt.sqrt())
}

pub fn mean_absolute_error(pred: &[f32], truth: &[f32]) -> f64 {
    let n = pred.len().min(truth.len());
    if n == 0 {
        return f64::NAN;
    }
    pred.iter()
        .zip(truth)
        .map(|(&p, &t)| (p as f64 - t as f64).abs())
        .sum::<f64>()
        / n as f64
}

pub fn polarity_accuracy(predictions: &Predictions, labels: &[SentimentLabels]) -> f64 {
    accuracy(
        predictions.polarity_classes().iter().zip(labels),
        |(p, l)| **p == l.polarity,
        labels.len(),
    )
}

pub fn intensity_accuracy(predictions: &Predictions, labels: &[SentimentLabels]) -> f64 {
    accuracy(
        predictions.intensity_classes().iter().zip(labels),
        |(p, l)| **p == l.intensity,
        labels.len(),
    )
}

fn accuracy<I, F>(pairs: I, hit: F, total: usize) -> f64
where
    I: Iterator,
    F: Fn(&I::Item) -> bool,
{
    if total == 0 {
        return f64::NAN;
    }
    pairs.filter(|pair| hit(pair)).count() as f64 / total as f64
}
