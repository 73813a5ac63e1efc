// ============================================================
// Layer 4 — Sentiment Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<SentimentSample>
// into tensors:
//
//   features:  [N, steps, dim]   fused input sequences
//   valence:   [N, 1]            regression target
//   polarity:  [N, 1]            0.0 / 1.0 binary target
//   intensity: [N]               class index 0..4
//
// All samples are pre-padded to the same number of steps, so
// the flat buffers reshape directly.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::TensorData,
};

use crate::data::dataset::SentimentSample;

#[derive(Debug, Clone)]
pub struct SentimentBatch<B: Backend> {
    pub features:  Tensor<B, 3>,
    pub valence:   Tensor<B, 2>,
    pub polarity:  Tensor<B, 2>,
    pub intensity: Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct SentimentBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> SentimentBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<SentimentSample, SentimentBatch<B>> for SentimentBatcher<B> {
    fn batch(&self, items: Vec<SentimentSample>) -> SentimentBatch<B> {
        let batch_size = items.len();
        let steps      = items.first().map(|s| s.steps).unwrap_or(0);
        let dim        = items.first().map(|s| s.dim).unwrap_or(0);

        let features: Vec<f32> = items
            .iter()
            .flat_map(|s| s.features.iter().copied())
            .collect();
        let valence: Vec<f32> = items.iter().map(|s| s.labels.valence).collect();
        let polarity: Vec<f32> = items
            .iter()
            .map(|s| s.labels.polarity.label() as f32)
            .collect();
        let intensity: Vec<i32> = items
            .iter()
            .map(|s| s.labels.intensity.index() as i32)
            .collect();

        let features = Tensor::<B, 3>::from_data(
            TensorData::new(features, [batch_size, steps, dim]),
            &self.device,
        );
        let valence = Tensor::<B, 2>::from_data(
            TensorData::new(valence, [batch_size, 1]),
            &self.device,
        );
        let polarity = Tensor::<B, 2>::from_data(
            TensorData::new(polarity, [batch_size, 1]),
            &self.device,
        );
        let intensity = Tensor::<B, 1, Int>::from_ints(intensity.as_slice(), &self.device);

        SentimentBatch { features, valence, polarity, intensity }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::padding::PaddedSequence;
    use crate::domain::sentiment::SentimentLabels;
    use crate::domain::utterance::UtteranceId;

    type TestBackend = burn::backend::NdArray;

    fn sample(score: f32, fill: f32) -> SentimentSample {
        let rows = vec![vec![fill, fill + 1.0, fill + 2.0]; 2];
        SentimentSample::new(
            UtteranceId::new("v", "0"),
            PaddedSequence::from_rows(&rows).unwrap(),
            SentimentLabels::from_score(score),
        )
    }

    #[test]
    fn test_batch_shapes_and_targets() {
        let batcher = SentimentBatcher::<TestBackend>::new(Default::default());
        let batch   = batcher.batch(vec![sample(-1.7, 0.0), sample(2.6, 10.0)]);

        assert_eq!(batch.features.dims(), [2, 2, 3]);
        assert_eq!(batch.valence.dims(), [2, 1]);
        assert_eq!(batch.polarity.dims(), [2, 1]);
        assert_eq!(batch.intensity.dims(), [2]);

        let polarity: Vec<f32> = batch.polarity.into_data().convert::<f32>().to_vec().unwrap();
        assert_eq!(polarity, vec![0.0, 1.0]);

        let intensity: Vec<i64> = batch.intensity.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(intensity, vec![2, 3]);

        let features: Vec<f32> = batch.features.into_data().convert::<f32>().to_vec().unwrap();
        assert_eq!(&features[6..9], &[10.0, 11.0, 12.0]);
    }
}
