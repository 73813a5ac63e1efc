// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores everything `predict` needs to reproduce a
// trained run:
//
//   checkpoints/
//     train_config.json      ← run hyperparameters
//     model_config.json      ← network shape (input width, steps, ...)
//     normalizer.json        ← per-modality training divisors
//     model_epoch_N.mpk.gz   ← weights after epoch N
//     latest_epoch.json      ← number of the newest weights file
//
// Weights go through Burn's CompactRecorder (MessagePack + gzip);
// loading fails if the architecture does not match.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::application::train_use_case::TrainConfig;
use crate::data::normalizer::ModalityNormalizers;
use crate::ml::model::{MultitaskConfig, MultitaskModel};

const TRAIN_CONFIG_FILE: &str = "train_config.json";
const MODEL_CONFIG_FILE: &str = "model_config.json";
const NORMALIZER_FILE: &str = "normalizer.json";
const LATEST_EPOCH_FILE: &str = "latest_epoch.json";

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create the manager, creating the directory like `mkdir -p`.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint dir '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Open an existing checkpoint directory without creating it.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            anyhow::bail!(
                "Checkpoint dir '{}' does not exist. Have you run 'train' first?",
                dir.display()
            );
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save weights as `model_epoch_{epoch}` and point latest_epoch.json at it.
    pub fn save_model<B: Backend>(&self, model: &MultitaskModel<B>, epoch: usize) -> Result<()> {
        let path = self.dir.join(format!("model_epoch_{epoch}"));

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        self.write_json(LATEST_EPOCH_FILE, &epoch)?;
        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Load the newest weights into a freshly initialised model.
    pub fn load_model<B: Backend>(
        &self,
        model:  MultitaskModel<B>,
        device: &B::Device,
    ) -> Result<MultitaskModel<B>> {
        let epoch = self.latest_epoch()?;
        let path  = self.dir.join(format!("model_epoch_{epoch}"));

        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| format!("Cannot load checkpoint '{}'", path.display()))?;
        Ok(model.load_record(record))
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.write_json(TRAIN_CONFIG_FILE, cfg)
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        self.read_json(TRAIN_CONFIG_FILE)
    }

    pub fn save_model_config(&self, cfg: &MultitaskConfig) -> Result<()> {
        self.write_json(MODEL_CONFIG_FILE, cfg)
    }

    pub fn load_model_config(&self) -> Result<MultitaskConfig> {
        self.read_json(MODEL_CONFIG_FILE)
    }

    pub fn save_normalizers(&self, normalizers: &ModalityNormalizers) -> Result<()> {
        self.write_json(NORMALIZER_FILE, normalizers)
    }

    pub fn load_normalizers(&self) -> Result<ModalityNormalizers> {
        self.read_json(NORMALIZER_FILE)
    }

    pub fn latest_epoch(&self) -> Result<usize> {
        self.read_json(LATEST_EPOCH_FILE)
    }

    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Wrote '{}'", path.display());
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read '{}'. Make sure you have run 'train' before 'predict'.",
                path.display()
            )
        })?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed '{}'", path.display()))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::TensorData;

    use crate::data::normalizer::MaxAbsNormalizer;
    use crate::data::padding::PaddedSequence;
    use crate::domain::utterance::Modality;
    use crate::ml::model::Architecture;
    use crate::ml::predictor::to_host;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_config_roundtrip() {
        let tmp  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(tmp.path()).unwrap();
        let cfg  = TrainConfig { max_len: 20, patience: 3, ..TrainConfig::default() };
        ckpt.save_config(&cfg).unwrap();

        let loaded = ckpt.load_config().unwrap();
        assert_eq!(loaded.max_len, 20);
        assert_eq!(loaded.patience, 3);
        assert_eq!(loaded.modalities, cfg.modalities);
    }

    #[test]
    fn test_normalizers_roundtrip() {
        let tmp  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(tmp.path()).unwrap();

        let train = [PaddedSequence::from_rows(&[vec![2.0, -8.0]]).unwrap()];
        let mut set = ModalityNormalizers::new();
        set.insert(Modality::Visual, MaxAbsNormalizer::fit(&train).unwrap());
        ckpt.save_normalizers(&set).unwrap();

        assert_eq!(ckpt.load_normalizers().unwrap(), set);
    }

    #[test]
    fn test_model_roundtrip_restores_weights() {
        let tmp    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(tmp.path()).unwrap();
        let device = Default::default();

        let model_cfg = MultitaskConfig::new(Architecture::Lstm, 3, 2).with_lstm_hidden(4);
        ckpt.save_model_config(&model_cfg).unwrap();
        let model: MultitaskModel<TestBackend> = model_cfg.init(&device);
        ckpt.save_model(&model, 7).unwrap();
        assert_eq!(ckpt.latest_epoch().unwrap(), 7);

        let reloaded_cfg = ckpt.load_model_config().unwrap();
        let fresh: MultitaskModel<TestBackend> = reloaded_cfg.init(&device);
        let restored = ckpt.load_model(fresh, &device).unwrap();

        let x = Tensor::<TestBackend, 3>::from_data(
            TensorData::new(vec![0.3f32, -0.1, 0.7, 0.2, 0.0, -0.4], [1, 2, 3]),
            &device,
        );
        let a = to_host(model.forward(x.clone()).valence).unwrap();
        let b = to_host(restored.forward(x).valence).unwrap();
        // CompactRecorder stores half precision
        assert!((a[0] - b[0]).abs() < 1e-2);
    }

    #[test]
    fn test_open_missing_dir_fails() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(CheckpointManager::open(tmp.path().join("nope")).is_err());
        assert!(CheckpointManager::open(tmp.path()).unwrap().load_config().is_err());
    }
}
