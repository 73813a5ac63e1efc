// ============================================================
// Layer 4 — Corpus Loader
// ============================================================
// Reads a multimodal corpus stored as a directory of JSON files:
//
//   <data_dir>/
//     embeddings.json   {video: {segment: [[start, end, [f...]], ...]}}
//     covarep.json      same layout, acoustic frames
//     facet.json        same layout, facial frames
//     sentiments.json   {video: {segment: score}}
//     splits.json       {"train": [video...], "valid": [...], "test": [...]}
//
// Only the modalities a run asks for are read.
//
// Reference: serde_json documentation
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use crate::domain::traits::FeatureSource;
use crate::domain::utterance::{FeatureStreams, Modality, SentimentTable, Splits};

pub const SENTIMENTS_FILE: &str = "sentiments.json";
pub const SPLITS_FILE: &str = "splits.json";

/// A corpus directory on local disk.
/// Implements the FeatureSource trait from Layer 3.
pub struct JsonCorpus {
    dir: PathBuf,
}

impl JsonCorpus {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file holding one modality's streams.
    pub fn stream_path(&self, modality: Modality) -> PathBuf {
        self.dir.join(format!("{}.json", modality.source_name()))
    }
}

impl FeatureSource for JsonCorpus {
    fn load_streams(&self, modality: Modality) -> Result<FeatureStreams> {
        let path    = self.stream_path(modality);
        let streams: FeatureStreams = read_json(&path)
            .with_context(|| format!("Cannot load {modality} features"))?;

        let segments: usize = streams.values().map(|s| s.len()).sum();
        tracing::info!(
            "Loaded {} features: {} videos, {} segments",
            modality,
            streams.len(),
            segments
        );
        Ok(streams)
    }

    fn load_sentiments(&self) -> Result<SentimentTable> {
        read_json(&self.dir.join(SENTIMENTS_FILE)).context("Cannot load sentiment labels")
    }

    fn load_splits(&self) -> Result<Splits> {
        let splits: Splits = read_json(&self.dir.join(SPLITS_FILE))
            .context("Cannot load partition ids")?;
        tracing::debug!(
            "Splits: {} train, {} valid, {} test videos",
            splits.train.len(),
            splits.valid.len(),
            splits.test.len()
        );
        Ok(splits)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path)
        .with_context(|| format!("Cannot open '{}'", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Malformed JSON in '{}'", path.display()))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn test_loads_streams_sentiments_and_splits() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "covarep.json", r#"{"v1": {"0": [[0.0, 0.1, [1.0, 2.0]]], "1": []}}"#);
        write(tmp.path(), "sentiments.json", r#"{"v1": {"0": 1.5, "1": -0.2}}"#);
        write(tmp.path(), "splits.json", r#"{"train": ["v1"], "valid": [], "test": []}"#);

        let corpus  = JsonCorpus::new(tmp.path());
        let streams = corpus.load_streams(Modality::Audio).unwrap();
        assert_eq!(streams["v1"]["0"][0].values, vec![1.0, 2.0]);
        assert!(streams["v1"]["1"].is_empty());

        let sentiments = corpus.load_sentiments().unwrap();
        assert_eq!(sentiments["v1"]["1"], -0.2);

        let splits = corpus.load_splits().unwrap();
        assert_eq!(splits.train, vec!["v1".to_string()]);
    }

    #[test]
    fn test_missing_modality_file_is_an_error() {
        let tmp    = tempfile::tempdir().unwrap();
        let corpus = JsonCorpus::new(tmp.path());
        let err    = corpus.load_streams(Modality::Visual).unwrap_err();
        assert!(format!("{err:#}").contains("facet.json"));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "splits.json", "{not json");
        assert!(JsonCorpus::new(tmp.path()).load_splits().is_err());
    }
}
