// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting file outputs:
//
//   checkpoint.rs — weights (CompactRecorder), run config,
//                   model config and normaliser statistics
//
//   metrics.rs    — per-epoch training metrics CSV
//
//   exporter.rs   — prediction and ground-truth label files
//
//   run_log.rs    — the run report, tee'd to stdout and a
//                   log file
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// Prediction / label CSV writer
pub mod exporter;

/// Stdout + file run report
pub mod run_log;
