// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Train + validation loop using Burn's DataLoader and Adam.
//
//   - Training uses TrainBackend (Autodiff<Wgpu>) for gradients
//   - model.valid() returns the model on the inner backend with
//     dropout disabled; validation runs there
//   - The loop stops at max_epochs or when early stopping runs
//     out of patience on the validation loss
//   - Weights are checkpointed after every epoch; the returned
//     model is the one from the last epoch run
//
// The loop is generic over the autodiff backend so tests can run
// it on NdArray; `train` picks Wgpu.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::SentimentBatcher, dataset::SentimentDataset};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
    run_log::RunLog,
};
use crate::ml::early_stopping::{EarlyStopping, StopDecision};
use crate::ml::evaluator::evaluate;
use crate::ml::model::{MultitaskConfig, MultitaskModel};

pub type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;
pub type InferBackend = burn::backend::Wgpu;

/// How a training run ended.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    pub epochs_run:    usize,
    pub best_epoch:    usize,
    pub best_val_loss: f64,
    pub stopped_early: bool,
}

pub fn train_loop<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    model_cfg:     &MultitaskConfig,
    train_dataset: SentimentDataset,
    val_dataset:   &SentimentDataset,
    ckpt_manager:  &CheckpointManager,
    log:           &RunLog,
    device:        &B::Device,
) -> Result<(MultitaskModel<B::InnerBackend>, TrainingSummary)> {
    B::seed(cfg.seed);
    let weights = cfg.loss_weights();

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: MultitaskModel<B> = model_cfg.init(device);
    tracing::info!(
        "Model ready: {:?} trunk, input {}x{}, trunk width {}",
        model_cfg.architecture,
        model_cfg.steps,
        model_cfg.input_dim,
        model_cfg.trunk_dim()
    );

    // ── Adam optimiser ────────────────────────────────────────────────────────
    let optim_cfg = AdamConfig::new()
        .with_beta_1(cfg.beta_1 as f32)
        .with_beta_2(cfg.beta_2 as f32)
        .with_epsilon(cfg.epsilon as f32);
    let mut optim = optim_cfg.init();

    // ── Training data loader (shuffled each epoch) ────────────────────────────
    let train_batcher = SentimentBatcher::<B>::new(device.clone());
    let train_loader  = DataLoaderBuilder::new(train_batcher)
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .build(train_dataset);

    let metrics = MetricsLogger::new(ckpt_manager.dir())?;
    let mut stopper = EarlyStopping::new(cfg.patience);
    let mut summary = TrainingSummary {
        epochs_run:    0,
        best_epoch:    0,
        best_val_loss: f64::INFINITY,
        stopped_early: false,
    };

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.max_epochs {
        let mut train_loss_sum = 0.0f64;
        let mut train_seen     = 0usize;

        for batch in train_loader.iter() {
            let n = batch.valence.dims()[0];
            let (loss, _) = model.forward_loss(&batch, &weights);

            train_loss_sum += loss.total.clone().into_scalar().elem::<f64>() * n as f64;
            train_seen     += n;

            // Backward pass + Adam update
            let grads = loss.total.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
        }

        let train_loss = if train_seen > 0 {
            train_loss_sum / train_seen as f64
        } else { f64::NAN };

        // ── Validation phase (dropout off, no autodiff) ───────────────────────
        let model_valid = model.valid();
        let (val, _) = evaluate(&model_valid, val_dataset, cfg.batch_size, &weights, device)?;

        log.line(format!(
            "Epoch {:>4}/{} | loss={:.4} | val_loss={:.4} | val_mae={:.4} | val_cc={:.4} | val_pol_acc={:.1}% | val_int_acc={:.1}%",
            epoch, cfg.max_epochs, train_loss, val.loss, val.mae, val.pearson,
            val.polarity_accuracy * 100.0, val.intensity_accuracy * 100.0,
        ))?;
        metrics.log(&EpochMetrics::new(epoch, train_loss, &val))?;

        ckpt_manager.save_model(&model, epoch)?;
        summary.epochs_run = epoch;

        match stopper.update(epoch, val.loss) {
            StopDecision::Improved => {
                tracing::debug!("Epoch {} improved val_loss to {:.4}", epoch, val.loss);
            }
            StopDecision::Continue => {}
            StopDecision::Stop => {
                log.line(format!(
                    "Early stopping at epoch {}: no val_loss improvement since epoch {}",
                    epoch, stopper.best_epoch()
                ))?;
                summary.stopped_early = true;
                break;
            }
        }
    }

    summary.best_epoch    = stopper.best_epoch();
    summary.best_val_loss = stopper.best_loss();
    tracing::info!(
        "Training finished after {} epochs (best epoch {}, val_loss {:.4})",
        summary.epochs_run,
        summary.best_epoch,
        summary.best_val_loss
    );
    Ok((model.valid(), summary))
}
