// ============================================================
// Layer 4 — Synthetic Demo Corpus
// ============================================================
// Writes a small corpus in the same on-disk layout the loader
// reads, so the whole pipeline can be run without the real
// dataset. Each utterance gets a hidden sentiment score in
// [-3, 3]; every modality carries a noisy trace of it on its
// own scale and frame rate:
//
//   text   — one step per word, score/3 on the first channels
//   audio  — 100 ms frames, score × 40 on channel 0, some nulls
//   visual — 200 ms frames, score × 5 on channel 0
//
// Word counts straddle the default max_len so both padding and
// truncation are exercised.

use anyhow::{Context, Result};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use serde::Serialize;
use std::{fs, path::Path};

use crate::data::loader::{SENTIMENTS_FILE, SPLITS_FILE};
use crate::domain::utterance::{FeatureStep, FeatureStreams, Modality, SentimentTable, Splits};

#[derive(Debug, Clone)]
pub struct DemoCorpusConfig {
    pub videos:       usize,
    pub text_dim:     usize,
    pub audio_dim:    usize,
    pub visual_dim:   usize,
    pub seed:         u64,
}

impl Default for DemoCorpusConfig {
    fn default() -> Self {
        Self { videos: 30, text_dim: 16, audio_dim: 8, visual_dim: 6, seed: 7 }
    }
}

/// Summary of what was written.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoCorpusStats {
    pub videos:   usize,
    pub segments: usize,
}

pub fn write_demo_corpus(dir: &Path, cfg: &DemoCorpusConfig) -> Result<DemoCorpusStats> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Cannot create '{}'", dir.display()))?;

    let mut rng        = StdRng::seed_from_u64(cfg.seed);
    let mut text       = FeatureStreams::new();
    let mut audio      = FeatureStreams::new();
    let mut visual     = FeatureStreams::new();
    let mut sentiments = SentimentTable::new();
    let mut segments   = 0usize;

    let video_ids: Vec<String> = (0..cfg.videos).map(|i| format!("vid{i:03}")).collect();

    for video in &video_ids {
        for seg in 0..rng.gen_range(3..8) {
            let segment = seg.to_string();
            let score: f32 = rng.gen_range(-3.0..=3.0);

            // ── words ─────────────────────────────────────────────────────────
            let mut words = Vec::new();
            let mut t     = 0.0f64;
            for _ in 0..rng.gen_range(3..24) {
                let dur = rng.gen_range(0.15..0.5);
                let values = (0..cfg.text_dim)
                    .map(|d| {
                        let signal = if d < 4 { score / 3.0 } else { 0.0 };
                        signal + rng.gen_range(-0.3..0.3)
                    })
                    .collect();
                words.push(FeatureStep::new(t, t + dur, values));
                t += dur;
            }
            let duration = t;

            // ── acoustic frames ───────────────────────────────────────────────
            let audio_frames = frames(duration, 0.1, |_| {
                (0..cfg.audio_dim)
                    .map(|d| {
                        if d == 0 {
                            score * 40.0 + rng.gen_range(-20.0..20.0)
                        } else if rng.gen_bool(0.02) {
                            f32::NAN
                        } else {
                            rng.gen_range(-100.0..100.0)
                        }
                    })
                    .collect()
            });

            // ── facial frames ─────────────────────────────────────────────────
            let visual_frames = frames(duration, 0.2, |_| {
                (0..cfg.visual_dim)
                    .map(|d| match d {
                        0 => score * 5.0 + rng.gen_range(-2.0..2.0),
                        // never-active action unit
                        1 => 0.0,
                        _ => rng.gen_range(-3.0..3.0),
                    })
                    .collect()
            });

            text.entry(video.clone()).or_default().insert(segment.clone(), words);
            audio.entry(video.clone()).or_default().insert(segment.clone(), audio_frames);
            visual.entry(video.clone()).or_default().insert(segment.clone(), visual_frames);
            sentiments.entry(video.clone()).or_default().insert(segment, score);
            segments += 1;
        }
    }

    let mut shuffled = video_ids.clone();
    shuffled.shuffle(&mut rng);
    let n_train = (shuffled.len() * 6) / 10;
    let n_valid = (shuffled.len() * 2) / 10;
    let splits = Splits {
        train: shuffled[..n_train].to_vec(),
        valid: shuffled[n_train..n_train + n_valid].to_vec(),
        test:  shuffled[n_train + n_valid..].to_vec(),
    };

    write_json(&dir.join(format!("{}.json", Modality::Text.source_name())), &text)?;
    write_json(&dir.join(format!("{}.json", Modality::Audio.source_name())), &audio)?;
    write_json(&dir.join(format!("{}.json", Modality::Visual.source_name())), &visual)?;
    write_json(&dir.join(SENTIMENTS_FILE), &sentiments)?;
    write_json(&dir.join(SPLITS_FILE), &splits)?;

    tracing::info!(
        "Wrote demo corpus to '{}': {} videos, {} segments",
        dir.display(),
        video_ids.len(),
        segments
    );
    Ok(DemoCorpusStats { videos: video_ids.len(), segments })
}

/// Back-to-back frames of length `step` covering `[0, duration)`.
fn frames(duration: f64, step: f64, mut values: impl FnMut(usize) -> Vec<f32>) -> Vec<FeatureStep> {
    let mut out = Vec::new();
    let mut t   = 0.0;
    let mut i   = 0;
    while t < duration {
        out.push(FeatureStep::new(t, t + step, values(i)));
        t += step;
        i += 1;
    }
    out
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    fs::write(path, json).with_context(|| format!("Cannot write '{}'", path.display()))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::JsonCorpus;
    use crate::domain::traits::FeatureSource;

    #[test]
    fn test_demo_corpus_loads_back() {
        let tmp   = tempfile::tempdir().unwrap();
        let cfg   = DemoCorpusConfig { videos: 10, ..Default::default() };
        let stats = write_demo_corpus(tmp.path(), &cfg).unwrap();
        assert_eq!(stats.videos, 10);

        let corpus = JsonCorpus::new(tmp.path());
        let splits = corpus.load_splits().unwrap();
        assert_eq!(splits.train.len() + splits.valid.len() + splits.test.len(), 10);
        assert_eq!(splits.train.len(), 6);

        let text = corpus.load_streams(Modality::Text).unwrap();
        let audio = corpus.load_streams(Modality::Audio).unwrap();
        let sentiments = corpus.load_sentiments().unwrap();
        let total: usize = text.values().map(|s| s.len()).sum();
        assert_eq!(total, stats.segments);
        assert_eq!(audio.len(), 10);

        for (video, segs) in &sentiments {
            for score in segs.values() {
                assert!((-3.0..=3.0).contains(score), "{video}: {score}");
            }
        }
    }

    #[test]
    fn test_same_seed_same_corpus() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        let cfg = DemoCorpusConfig { videos: 4, ..Default::default() };
        write_demo_corpus(a.path(), &cfg).unwrap();
        write_demo_corpus(b.path(), &cfg).unwrap();
        let fa = fs::read_to_string(a.path().join(SENTIMENTS_FILE)).unwrap();
        let fb = fs::read_to_string(b.path().join(SENTIMENTS_FILE)).unwrap();
        assert_eq!(fa, fb);
    }
}
