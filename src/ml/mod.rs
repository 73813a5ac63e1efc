// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All model code lives here:
//
//   model.rs          — shared trunk (LSTM or per-step dense
//                       stack) with three heads:
//                       • valence regression (scaled tanh)
//                       • polarity classification (sigmoid)
//                       • intensity classification (softmax)
//                       and the weighted multitask loss
//
//   trainer.rs        — epoch loop: forward, backward, Adam
//                       step, validation, checkpointing
//
//   early_stopping.rs — patience on the validation loss
//
//   evaluator.rs      — losses, Pearson r, MAE and accuracies
//                       on one partition
//
//   predictor.rs      — batched inference back to host vectors
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Caruana (1997) Multitask Learning

/// Multitask network and its objective
pub mod model;

/// Training loop with validation and checkpointing
pub mod trainer;

/// Validation-loss patience tracking
pub mod early_stopping;

/// Partition-level metrics
pub mod evaluator;

/// Batched inference
pub mod predictor;
