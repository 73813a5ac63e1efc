// ============================================================
// Layer 5 — Predictor
// ============================================================
// Runs a trained model over a dataset in fixed-size batches and
// brings the three outputs back to the host:
//
//   valence   — scaled tanh regression, one value per utterance
//   polarity  — probability of "positive" (sigmoid)
//   intensity — distribution over the 4 classes (softmax)

use anyhow::{anyhow, bail, Result};
use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::{batcher::{SentimentBatch, SentimentBatcher}, dataset::SentimentDataset};
use crate::domain::sentiment::{Intensity, Polarity};
use crate::ml::model::{MultitaskModel, MultitaskOutput};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predictions {
    pub valence:   Vec<f32>,
    pub polarity:  Vec<f32>,
    pub intensity: Vec<[f32; Intensity::COUNT]>,
}

impl Predictions {
    pub fn len(&self) -> usize { self.valence.len() }

    pub fn is_empty(&self) -> bool { self.valence.is_empty() }

    pub fn polarity_classes(&self) -> Vec<Polarity> {
        self.polarity.iter().map(|&p| Polarity::from_probability(p)).collect()
    }

    pub fn intensity_classes(&self) -> Vec<Intensity> {
        self.intensity.iter().map(Intensity::from_distribution).collect()
    }

    /// Append the host copy of one batch's outputs.
    pub fn extend_from_output<B: Backend>(&mut self, output: &MultitaskOutput<B>) -> Result<()> {
        let valence   = to_host(output.valence.clone())?;
        let polarity  = to_host(output.polarity_probs())?;
        let intensity = to_host(output.intensity_probs())?;

        if intensity.len() != valence.len() * Intensity::COUNT {
            bail!("intensity output has {} values for {} rows", intensity.len(), valence.len());
        }
        self.valence.extend(valence);
        self.polarity.extend(polarity);
        self.intensity.extend(intensity.chunks_exact(Intensity::COUNT).map(|row| {
            let mut probs = [0.0; Intensity::COUNT];
            probs.copy_from_slice(row);
            probs
        }));
        Ok(())
    }
}

/// Split a dataset into consecutive batches (no shuffling).
pub fn batches<B: Backend>(
    dataset:    &SentimentDataset,
    batch_size: usize,
    device:     &B::Device,
) -> Result<Vec<SentimentBatch<B>>> {
    if batch_size == 0 {
        bail!("batch size must be positive");
    }
    let batcher = SentimentBatcher::<B>::new(device.clone());
    Ok(dataset
        .samples()
        .chunks(batch_size)
        .map(|chunk| batcher.batch(chunk.to_vec()))
        .collect())
}

pub fn predict<B: Backend>(
    model:      &MultitaskModel<B>,
    dataset:    &SentimentDataset,
    batch_size: usize,
    device:     &B::Device,
) -> Result<Predictions> {
    let mut predictions = Predictions::default();
    for batch in batches::<B>(dataset, batch_size, device)? {
        let output = model.forward(batch.features);
        predictions.extend_from_output(&output)?;
    }
    tracing::debug!("Predicted {} utterances", predictions.len());
    Ok(predictions)
}

pub fn to_host<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<Vec<f32>> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow!("Cannot read tensor back to host: {e:?}"))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{dataset::SentimentSample, padding::PaddedSequence};
    use crate::domain::sentiment::SentimentLabels;
    use crate::domain::utterance::UtteranceId;
    use crate::ml::model::{Architecture, MultitaskConfig};

    type TestBackend = burn::backend::NdArray;

    fn dataset(n: usize) -> SentimentDataset {
        let samples = (0..n)
            .map(|i| {
                SentimentSample::new(
                    UtteranceId::new("v", i.to_string()),
                    PaddedSequence::from_rows(&vec![vec![i as f32 / 10.0; 3]; 4]).unwrap(),
                    SentimentLabels::from_score(i as f32 / 2.0 - 1.5),
                )
            })
            .collect();
        SentimentDataset::new(samples)
    }

    #[test]
    fn test_predicts_every_sample_across_batches() {
        let device = Default::default();
        let model: MultitaskModel<TestBackend> =
            MultitaskConfig::new(Architecture::Dense, 3, 4).init(&device);

        let preds = predict(&model, &dataset(7), 3, &device).unwrap();
        assert_eq!(preds.len(), 7);
        assert_eq!(preds.polarity.len(), 7);
        assert_eq!(preds.intensity.len(), 7);
        assert_eq!(preds.intensity_classes().len(), 7);
    }

    #[test]
    fn test_zero_batch_size_is_an_error() {
        let device = Default::default();
        assert!(batches::<TestBackend>(&dataset(2), 0, &device).is_err());
    }

    #[test]
    fn test_class_decisions() {
        let preds = Predictions {
            valence:   vec![0.2, -1.0],
            polarity:  vec![0.7, 0.2],
            intensity: vec![[0.1, 0.7, 0.1, 0.1], [0.0, 0.0, 0.2, 0.8]],
        };
        assert_eq!(preds.polarity_classes(), vec![Polarity::Positive, Polarity::Negative]);
        assert_eq!(preds.intensity_classes(), vec![Intensity::Weak, Intensity::Strong]);
    }
}
