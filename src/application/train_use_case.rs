// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Prepare train/valid/test sets   (Layer 2 - prepare)
//   Step 2: Save config + normalisers       (Layer 6 - infra)
//   Step 3: Build the model config          (Layer 5 - ml)
//   Step 4: Run training loop               (Layer 5 - ml)
//   Step 5: Evaluate every partition        (Layer 5 - ml)
//   Step 6: Export test predictions         (Layer 6 - infra)
//           (+ ground truth for case studies)
//
// Reference: Burn Book §5 (Training)

use anyhow::{bail, Result};
use burn::tensor::backend::AutodiffBackend;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::application::prepare::prepare_corpus;
use crate::data::loader::JsonCorpus;
use crate::domain::{
    sentiment::SentimentLabels,
    utterance::{Modality, Partition},
};
use crate::infra::{
    checkpoint::CheckpointManager,
    exporter::PredictionExporter,
    run_log::RunLog,
};
use crate::ml::{
    evaluator::{evaluate, intensity_accuracy, mean_absolute_error, pearson, polarity_accuracy},
    model::{Architecture, LossWeights, MultitaskConfig},
    predictor::Predictions,
    trainer::{train_loop, TrainBackend, TrainingSummary},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Saved next to the weights so `predict` can rebuild the same
// feature pipeline and network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:         String,
    pub checkpoint_dir:   String,
    pub output_dir:       String,
    /// Goes into the prediction file names: pred_<tag>_sen.txt
    pub run_tag:          String,
    pub log_file:         Option<String>,
    pub case_study:       bool,
    pub modalities:       Vec<Modality>,
    /// Timeline every modality is resampled onto; also required to be
    /// present for an utterance to be selected, even when not fused.
    pub align_to:         Modality,
    pub architecture:     Architecture,
    pub max_len:          usize,
    pub batch_size:       usize,
    pub max_epochs:       usize,
    pub patience:         usize,
    pub lr:               f64,
    pub beta_1:           f64,
    pub beta_2:           f64,
    pub epsilon:          f64,
    pub input_dropout:    f64,
    pub lstm_hidden:      usize,
    pub dense_hidden:     usize,
    pub dense_layers:     usize,
    pub weight_valence:   f64,
    pub weight_polarity:  f64,
    pub weight_intensity: f64,
    /// None picks the architecture default: 0.01 for LSTM, 0 for dense.
    pub valence_l2:       Option<f64>,
    pub valence_scale:    f64,
    pub seed:             u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:         "data/mosi".to_string(),
            checkpoint_dir:   "checkpoints".to_string(),
            output_dir:       "predictions".to_string(),
            run_tag:          "FL_tri".to_string(),
            log_file:         None,
            case_study:       false,
            modalities:       vec![Modality::Text, Modality::Audio, Modality::Visual],
            align_to:         Modality::Text,
            architecture:     Architecture::Lstm,
            max_len:          15,
            batch_size:       128,
            max_epochs:       1000,
            patience:         5,
            lr:               5e-4,
            beta_1:           0.9,
            beta_2:           0.999,
            epsilon:          1e-8,
            input_dropout:    0.2,
            lstm_hidden:      128,
            dense_hidden:     32,
            dense_layers:     3,
            weight_valence:   1.0,
            weight_polarity:  0.5,
            weight_intensity: 0.5,
            valence_l2:       None,
            valence_scale:    3.0,
            seed:             42,
        }
    }
}

impl TrainConfig {
    pub fn loss_weights(&self) -> LossWeights {
        LossWeights {
            valence:    self.weight_valence,
            polarity:   self.weight_polarity,
            intensity:  self.weight_intensity,
            valence_l2: self.valence_l2.unwrap_or(match self.architecture {
                Architecture::Lstm  => 0.01,
                Architecture::Dense => 0.0,
            }),
        }
    }

    /// Network shape for a fused input of `input_dim` features per step.
    pub fn model_config(&self, input_dim: usize) -> MultitaskConfig {
        MultitaskConfig::new(self.architecture, input_dim, self.max_len)
            .with_input_dropout(self.input_dropout)
            .with_lstm_hidden(self.lstm_hidden)
            .with_dense_hidden(self.dense_hidden)
            .with_dense_layers(self.dense_layers)
            .with_valence_scale(self.valence_scale)
    }

    pub fn validate(&self) -> Result<()> {
        if self.modalities.is_empty() {
            bail!("select at least one modality");
        }
        if self.max_len == 0 {
            bail!("max_len must be positive");
        }
        if self.batch_size == 0 {
            bail!("batch_size must be positive");
        }
        if self.max_epochs == 0 {
            bail!("max_epochs must be positive");
        }
        if !(0.0..1.0).contains(&self.input_dropout) {
            bail!("input_dropout must be in [0, 1), got {}", self.input_dropout);
        }
        if self.lr < 0.0 {
            bail!("learning rate must not be negative");
        }
        let weights = [
            self.weight_valence,
            self.weight_polarity,
            self.weight_intensity,
            self.loss_weights().valence_l2,
        ];
        if weights.iter().any(|w| *w < 0.0 || !w.is_finite()) {
            bail!("loss weights must be finite and non-negative");
        }
        if self.architecture == Architecture::Lstm && self.lstm_hidden == 0 {
            bail!("lstm_hidden must be positive");
        }
        if self.dense_layers > 0 && self.dense_hidden == 0 {
            bail!("dense_hidden must be positive");
        }
        Ok(())
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Train on the default WGPU device.
    pub fn execute(&self) -> Result<TrainingSummary> {
        let device = burn::backend::wgpu::WgpuDevice::default();
        tracing::info!("Using WGPU device: {:?}", device);
        self.execute_on::<TrainBackend>(&device)
    }

    pub fn execute_on<B: AutodiffBackend>(&self, device: &B::Device) -> Result<TrainingSummary> {
        let cfg = &self.config;
        cfg.validate()?;
        let log = RunLog::open(cfg.log_file.as_deref().map(Path::new))?;

        // ── Step 1: Build the three datasets ──────────────────────────────────
        log.line("Preparing train and test data...")?;
        let source = JsonCorpus::new(&cfg.data_dir);
        let corpus = prepare_corpus(&source, cfg, None)?;
        log.line("Data preprocessing finished! Begin compiling and training model.")?;

        // ── Step 2: Save what `predict` needs ─────────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir)?;
        ckpt_manager.save_config(cfg)?;
        ckpt_manager.save_normalizers(&corpus.normalizers)?;

        // ── Step 3: Network shape follows the fused feature width ─────────────
        let model_cfg = cfg.model_config(corpus.train.feature_dim());
        ckpt_manager.save_model_config(&model_cfg)?;

        // ── Step 4: Train ─────────────────────────────────────────────────────
        log.line("Training...")?;
        let (model, summary) = train_loop::<B>(
            cfg,
            &model_cfg,
            corpus.train.clone(),
            &corpus.valid,
            &ckpt_manager,
            &log,
            device,
        )?;
        log.line(format!(
            "Stopped after {} epochs; best validation loss {:.4} at epoch {}",
            summary.epochs_run, summary.best_val_loss, summary.best_epoch
        ))?;

        // ── Step 5: Evaluate train / validation / test ────────────────────────
        let weights = cfg.loss_weights();
        let mut test_predictions = Predictions::default();
        for partition in Partition::ALL {
            let dataset = corpus.partition(partition);
            let (eval, predictions) = evaluate(&model, dataset, cfg.batch_size, &weights, device)?;
            tracing::debug!("{} loss {:.4} over {} samples", partition, eval.loss, eval.samples);
            report_partition(&log, partition, &predictions, &dataset.labels())?;
            if partition == Partition::Test {
                test_predictions = predictions;
            }
        }

        // ── Step 6: Export ────────────────────────────────────────────────────
        log.blank()?;
        log.line("Printing predictions...")?;
        let exporter = PredictionExporter::new(&cfg.output_dir, &cfg.run_tag)?;
        exporter.write_predictions(&test_predictions)?;
        if cfg.case_study {
            exporter.write_ground_truth(&corpus.test.labels())?;
        }

        log.blank()?;
        log.line("Done!")?;
        Ok(summary)
    }
}

/// Print the four headline numbers for one partition.
pub(crate) fn report_partition(
    log:         &RunLog,
    partition:   Partition,
    predictions: &Predictions,
    labels:      &[SentimentLabels],
) -> Result<()> {
    let name = match partition {
        Partition::Train => "Train",
        Partition::Valid => "Validation",
        Partition::Test  => "Test",
    };
    let truth: Vec<f32> = labels.iter().map(|l| l.valence).collect();

    log.blank()?;
    log.line(format!("Evaluating on {partition} set..."))?;
    log.line(format!("Valence {name} cc: {:.4}", pearson(&predictions.valence, &truth)))?;
    log.line(format!("Valence {name} mae: {:.4}", mean_absolute_error(&predictions.valence, &truth)))?;
    log.line(format!("Binary Polarity {name} accuracy: {:.4}", polarity_accuracy(predictions, labels)))?;
    log.line(format!("Intensity {name} accuracy: {:.4}", intensity_accuracy(predictions, labels)))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::synthetic::{write_demo_corpus, DemoCorpusConfig};
    use std::fs;

    type TestBackend = burn::backend::Autodiff<burn::backend::NdArray>;

    pub(crate) fn small_run(root: &Path) -> TrainConfig {
        let data = root.join("data");
        write_demo_corpus(&data, &DemoCorpusConfig { videos: 10, ..Default::default() }).unwrap();
        TrainConfig {
            data_dir:       data.display().to_string(),
            checkpoint_dir: root.join("ckpt").display().to_string(),
            output_dir:     root.join("out").display().to_string(),
            log_file:       Some(root.join("run.log").display().to_string()),
            case_study:     true,
            max_epochs:     2,
            batch_size:     16,
            lr:             0.01,
            lstm_hidden:    8,
            dense_hidden:   8,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(TrainConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        assert!(TrainConfig { modalities: vec![], ..Default::default() }.validate().is_err());
        assert!(TrainConfig { batch_size: 0, ..Default::default() }.validate().is_err());
        assert!(TrainConfig { input_dropout: 1.0, ..Default::default() }.validate().is_err());
        assert!(TrainConfig { weight_polarity: -0.5, ..Default::default() }.validate().is_err());
    }

    #[test]
    fn test_model_config_follows_run_config() {
        let cfg = TrainConfig { architecture: Architecture::Dense, max_len: 20, ..Default::default() };
        let m   = cfg.model_config(35);
        assert_eq!(m.input_dim, 35);
        assert_eq!(m.steps, 20);
        assert_eq!(m.dense_hidden, 32);
        assert_eq!(m.valence_scale, 3.0);
    }

    #[test]
    fn test_loss_weights() {
        let w = TrainConfig::default().loss_weights();
        assert_eq!((w.valence, w.polarity, w.intensity, w.valence_l2), (1.0, 0.5, 0.5, 0.01));
    }

    #[test]
    fn test_valence_l2_defaults_per_architecture() {
        let dense = TrainConfig { architecture: Architecture::Dense, ..Default::default() };
        assert_eq!(dense.loss_weights().valence_l2, 0.0);

        let explicit = TrainConfig { valence_l2: Some(0.2), ..dense };
        assert_eq!(explicit.loss_weights().valence_l2, 0.2);

        let negative = TrainConfig { valence_l2: Some(-1.0), ..Default::default() };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_end_to_end_training_run() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = small_run(tmp.path());
        let summary = TrainUseCase::new(cfg.clone())
            .execute_on::<TestBackend>(&Default::default())
            .unwrap();
        assert_eq!(summary.epochs_run, 2);

        let ckpt = Path::new(&cfg.checkpoint_dir);
        for file in ["train_config.json", "model_config.json", "normalizer.json", "metrics.csv"] {
            assert!(ckpt.join(file).exists(), "missing {file}");
        }

        let out = Path::new(&cfg.output_dir);
        let sen = fs::read_to_string(out.join("pred_FL_tri_sen.txt")).unwrap();
        let lab = fs::read_to_string(out.join("test_labels_sen.txt")).unwrap();
        assert_eq!(sen.lines().count(), lab.lines().count());

        let log = fs::read_to_string(tmp.path().join("run.log")).unwrap();
        assert!(log.contains("Valence Test cc:"));
        assert!(log.contains("Intensity Validation accuracy:"));
        assert!(log.trim_end().ends_with("Done!"));
    }
}
