// ============================================================
// Layer 4 — Partition Selection
// ============================================================
// Turns the video-level split into the list of utterances that
// take part in training / validation / test:
//
//   for video in split order:
//     for segment in the reference modality (sorted ids):
//       keep it only if EVERY selected modality has at
//       least one step for it
//
// Each kept utterance must have a sentiment score.

use anyhow::{anyhow, Result};
use std::collections::BTreeMap;

use crate::domain::utterance::{
    FeatureStep, FeatureStreams, Modality, Partition, SentimentTable, Splits, UtteranceId,
};

/// Aligned streams of every modality in the run.
pub type AlignedCorpus = BTreeMap<Modality, FeatureStreams>;

/// One utterance chosen for a partition, with its raw score.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedUtterance {
    pub id:    UtteranceId,
    pub score: f32,
}

pub fn select_utterances(
    partition:  Partition,
    splits:     &Splits,
    corpus:     &AlignedCorpus,
    reference:  Modality,
    sentiments: &SentimentTable,
) -> Result<Vec<SelectedUtterance>> {
    let reference_streams = corpus
        .get(&reference)
        .ok_or_else(|| anyhow!("reference modality {reference} was not loaded"))?;

    let mut selected = Vec::new();
    let mut skipped  = 0usize;

    for video in splits.videos(partition) {
        let Some(segments) = reference_streams.get(video) else {
            tracing::warn!("{partition} video '{video}' has no {reference} features, skipping");
            continue;
        };

        for segment in segments.keys() {
            let complete = corpus
                .values()
                .all(|streams| !lookup(streams, video, segment).is_empty());
            if !complete {
                skipped += 1;
                continue;
            }

            let score = sentiments
                .get(video)
                .and_then(|s| s.get(segment))
                .copied()
                .ok_or_else(|| anyhow!("no sentiment score for {video}[{segment}]"))?;

            selected.push(SelectedUtterance { id: UtteranceId::new(video, segment), score });
        }
    }

    tracing::info!(
        "{} partition: {} utterances ({} skipped for missing modalities)",
        partition,
        selected.len(),
        skipped
    );
    Ok(selected)
}

/// Steps of one utterance in one modality; empty when absent.
pub fn lookup<'a>(streams: &'a FeatureStreams, video: &str, segment: &str) -> &'a [FeatureStep] {
    streams
        .get(video)
        .and_then(|s| s.get(segment))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn streams(entries: &[(&str, &str, usize)]) -> FeatureStreams {
        let mut s = FeatureStreams::new();
        for &(v, seg, n) in entries {
            let steps = (0..n).map(|i| FeatureStep::new(i as f64, i as f64 + 1.0, vec![1.0])).collect();
            s.entry(v.to_string()).or_default().insert(seg.to_string(), steps);
        }
        s
    }

    fn sentiments(entries: &[(&str, &str, f32)]) -> SentimentTable {
        let mut t = SentimentTable::new();
        for &(v, seg, s) in entries {
            t.entry(v.to_string()).or_default().insert(seg.to_string(), s);
        }
        t
    }

    #[test]
    fn test_keeps_only_complete_utterances_in_split_order() {
        let mut corpus = AlignedCorpus::new();
        corpus.insert(Modality::Text, streams(&[("b", "0", 2), ("a", "0", 3), ("a", "1", 1)]));
        corpus.insert(Modality::Audio, streams(&[("b", "0", 2), ("a", "0", 3), ("a", "1", 0)]));

        let splits = Splits { train: vec!["b".into(), "a".into()], ..Default::default() };
        let labels = sentiments(&[("a", "0", 1.0), ("a", "1", 2.0), ("b", "0", -1.0)]);

        let out = select_utterances(Partition::Train, &splits, &corpus, Modality::Text, &labels).unwrap();
        let ids: Vec<String> = out.iter().map(|u| u.id.to_string()).collect();
        assert_eq!(ids, vec!["b[0]", "a[0]"]);
        assert_eq!(out[0].score, -1.0);
    }

    #[test]
    fn test_missing_sentiment_is_an_error() {
        let mut corpus = AlignedCorpus::new();
        corpus.insert(Modality::Audio, streams(&[("a", "0", 1)]));
        let splits = Splits { test: vec!["a".into()], ..Default::default() };

        let res = select_utterances(Partition::Test, &splits, &corpus, Modality::Audio, &SentimentTable::new());
        assert!(res.is_err());
    }

    #[test]
    fn test_unknown_video_is_skipped() {
        let mut corpus = AlignedCorpus::new();
        corpus.insert(Modality::Audio, streams(&[("a", "0", 1)]));
        let splits = Splits { valid: vec!["ghost".into()], ..Default::default() };

        let out = select_utterances(Partition::Valid, &splits, &corpus, Modality::Audio, &SentimentTable::new()).unwrap();
        assert!(out.is_empty());
    }
}
