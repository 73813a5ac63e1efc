// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Reloads a finished training run and writes test predictions:
//
//   Step 1: Load train_config.json + normalizer.json
//   Step 2: Rebuild the datasets with the saved normalisers
//   Step 3: Rebuild the model from model_config.json and
//           load the newest weights
//   Step 4: Predict on the test partition and report
//   Step 5: Export predictions (+ ground truth for case studies)

use anyhow::{bail, Result};
use burn::prelude::*;
use std::path::Path;

use crate::application::{prepare::prepare_corpus, train_use_case::report_partition};
use crate::data::loader::JsonCorpus;
use crate::domain::utterance::Partition;
use crate::infra::{checkpoint::CheckpointManager, exporter::PredictionExporter, run_log::RunLog};
use crate::ml::{
    model::MultitaskModel,
    predictor::{predict, Predictions},
    trainer::InferBackend,
};

/// Options for a prediction run. Unset fields fall back to the
/// values stored with the trained run.
#[derive(Debug, Clone, Default)]
pub struct PredictConfig {
    pub checkpoint_dir: String,
    pub data_dir:       Option<String>,
    pub output_dir:     Option<String>,
    pub run_tag:        Option<String>,
    pub case_study:     bool,
    pub log_file:       Option<String>,
}

pub struct PredictUseCase {
    config: PredictConfig,
}

impl PredictUseCase {
    pub fn new(config: PredictConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<Predictions> {
        let device = burn::backend::wgpu::WgpuDevice::default();
        tracing::info!("Using WGPU device: {:?}", device);
        self.execute_on::<InferBackend>(&device)
    }

    pub fn execute_on<B: Backend>(&self, device: &B::Device) -> Result<Predictions> {
        let opts = &self.config;
        let log  = RunLog::open(opts.log_file.as_deref().map(Path::new))?;

        // ── Step 1: Saved run ─────────────────────────────────────────────────
        let ckpt_manager = CheckpointManager::open(&opts.checkpoint_dir)?;
        let mut cfg = ckpt_manager.load_config()?;
        if let Some(dir) = &opts.data_dir {
            cfg.data_dir = dir.clone();
        }
        if let Some(dir) = &opts.output_dir {
            cfg.output_dir = dir.clone();
        }
        if let Some(tag) = &opts.run_tag {
            cfg.run_tag = tag.clone();
        }
        let normalizers = ckpt_manager.load_normalizers()?;

        // ── Step 2: Datasets with the training statistics ─────────────────────
        log.line("Preparing train and test data...")?;
        let corpus = prepare_corpus(&JsonCorpus::new(&cfg.data_dir), &cfg, Some(&normalizers))?;

        // ── Step 3: Model ─────────────────────────────────────────────────────
        let model_cfg = ckpt_manager.load_model_config()?;
        if model_cfg.input_dim != corpus.test.feature_dim() || model_cfg.steps != corpus.test.steps() {
            bail!(
                "Saved model expects {}x{} inputs but the data gives {}x{}",
                model_cfg.steps,
                model_cfg.input_dim,
                corpus.test.steps(),
                corpus.test.feature_dim()
            );
        }
        let model: MultitaskModel<B> = model_cfg.init(device);
        let model = ckpt_manager.load_model(model, device)?;

        // ── Step 4: Predict + report ──────────────────────────────────────────
        let predictions = predict(&model, &corpus.test, cfg.batch_size, device)?;
        let labels = corpus.test.labels();
        report_partition(&log, Partition::Test, &predictions, &labels)?;

        // ── Step 5: Export ────────────────────────────────────────────────────
        log.blank()?;
        log.line("Printing predictions...")?;
        let exporter = PredictionExporter::new(&cfg.output_dir, &cfg.run_tag)?;
        exporter.write_predictions(&predictions)?;
        if opts.case_study {
            exporter.write_ground_truth(&labels)?;
        }

        log.blank()?;
        log.line("Done!")?;
        Ok(predictions)
    }
}
