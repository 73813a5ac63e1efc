// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `predict` and
// `generate-demo`, and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, Modality, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::application::{predict_use_case::PredictConfig, train_use_case::TrainConfig};
use crate::data::synthetic::DemoCorpusConfig;
use crate::domain::utterance::Modality;
use crate::ml::model::Architecture;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a multitask sentiment model and export test predictions
    Train(TrainArgs),

    /// Reload a trained run and export test predictions
    Predict(PredictArgs),

    /// Write a small synthetic corpus in the dataset layout
    GenerateDemo(GenerateDemoArgs),
}

/// Trunk in front of the three task heads
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ArchitectureArg {
    /// LSTM over the sequence, last hidden state
    Lstm,
    /// Dense layers per step, flattened
    Dense,
}

impl From<ArchitectureArg> for Architecture {
    fn from(a: ArchitectureArg) -> Self {
        match a {
            ArchitectureArg::Lstm  => Architecture::Lstm,
            ArchitectureArg::Dense => Architecture::Dense,
        }
    }
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Dataset directory (embeddings.json, covarep.json, facet.json,
    /// sentiments.json, splits.json)
    #[arg(long, default_value = "data/mosi")]
    pub data_dir: String,

    /// Where weights, configs, normaliser statistics and metrics go
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Where prediction files go
    #[arg(long, default_value = "predictions")]
    pub output_dir: String,

    /// Name used in the prediction files: pred_<tag>_sen.txt
    #[arg(long, default_value = "FL_tri")]
    pub run_tag: String,

    /// Copy the run report to this file
    #[arg(long)]
    pub log_file: Option<String>,

    /// Also write the true test labels next to the predictions
    #[arg(long)]
    pub case_study: bool,

    /// Modalities to fuse, comma separated (text, audio, visual)
    #[arg(long, value_delimiter = ',', default_value = "text,audio,visual")]
    pub modalities: Vec<Modality>,

    /// Modality whose intervals every stream is aligned to
    #[arg(long, default_value = "text")]
    pub align_to: Modality,

    #[arg(long, value_enum, default_value_t = ArchitectureArg::Lstm)]
    pub architecture: ArchitectureArg,

    /// Steps every utterance is padded or truncated to
    #[arg(long, default_value_t = 15)]
    pub max_len: usize,

    #[arg(long, default_value_t = 128)]
    pub batch_size: usize,

    /// Upper bound; early stopping usually ends the run sooner
    #[arg(long, default_value_t = 1000)]
    pub max_epochs: usize,

    /// Non-improving epochs tolerated; the next one stops training
    #[arg(long, default_value_t = 5)]
    pub patience: usize,

    #[arg(long, default_value_t = 5e-4)]
    pub lr: f64,

    /// Dropout applied to the fused input
    #[arg(long, default_value_t = 0.2)]
    pub input_dropout: f64,

    #[arg(long, default_value_t = 128)]
    pub lstm_hidden: usize,

    #[arg(long, default_value_t = 32)]
    pub dense_hidden: usize,

    #[arg(long, default_value_t = 3)]
    pub dense_layers: usize,

    /// Loss weight of the valence regression
    #[arg(long, default_value_t = 1.0)]
    pub weight_valence: f64,

    /// Loss weight of the polarity classifier
    #[arg(long, default_value_t = 0.5)]
    pub weight_polarity: f64,

    /// Loss weight of the intensity classifier
    #[arg(long, default_value_t = 0.5)]
    pub weight_intensity: f64,

    /// L2 penalty on the valence head weights
    /// [default: 0.01 for lstm, 0 for dense]
    #[arg(long)]
    pub valence_l2: Option<f64>,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:         a.data_dir,
            checkpoint_dir:   a.checkpoint_dir,
            output_dir:       a.output_dir,
            run_tag:          a.run_tag,
            log_file:         a.log_file,
            case_study:       a.case_study,
            modalities:       a.modalities,
            align_to:         a.align_to,
            architecture:     a.architecture.into(),
            max_len:          a.max_len,
            batch_size:       a.batch_size,
            max_epochs:       a.max_epochs,
            patience:         a.patience,
            lr:               a.lr,
            input_dropout:    a.input_dropout,
            lstm_hidden:      a.lstm_hidden,
            dense_hidden:     a.dense_hidden,
            dense_layers:     a.dense_layers,
            weight_valence:   a.weight_valence,
            weight_polarity:  a.weight_polarity,
            weight_intensity: a.weight_intensity,
            valence_l2:       a.valence_l2,
            seed:             a.seed,
            ..TrainConfig::default()
        }
    }
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Directory written by `train`
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Dataset directory; defaults to the one used for training
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Defaults to the training run's output dir
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Defaults to the training run's tag
    #[arg(long)]
    pub run_tag: Option<String>,

    #[arg(long)]
    pub log_file: Option<String>,

    /// Also write the true test labels
    #[arg(long)]
    pub case_study: bool,
}

impl From<PredictArgs> for PredictConfig {
    fn from(a: PredictArgs) -> Self {
        PredictConfig {
            checkpoint_dir: a.checkpoint_dir,
            data_dir:       a.data_dir,
            output_dir:     a.output_dir,
            run_tag:        a.run_tag,
            case_study:     a.case_study,
            log_file:       a.log_file,
        }
    }
}

/// All arguments for the `generate-demo` command
#[derive(Args, Debug)]
pub struct GenerateDemoArgs {
    /// Directory to write the corpus into
    #[arg(long, default_value = "data/demo")]
    pub out_dir: PathBuf,

    #[arg(long, default_value_t = 30)]
    pub videos: usize,

    #[arg(long, default_value_t = 7)]
    pub seed: u64,
}

impl From<&GenerateDemoArgs> for DemoCorpusConfig {
    fn from(a: &GenerateDemoArgs) -> Self {
        DemoCorpusConfig {
            videos: a.videos,
            seed:   a.seed,
            ..DemoCorpusConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_args_become_config() {
        let cli = Cli::try_parse_from([
            "mosi-mtl", "train", "--modalities", "audio,visual", "--architecture", "dense",
            "--max-epochs", "20", "--case-study",
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();

        assert_eq!(cfg.modalities, vec![Modality::Audio, Modality::Visual]);
        assert_eq!(cfg.architecture, Architecture::Dense);
        assert_eq!(cfg.max_epochs, 20);
        assert!(cfg.case_study);
        assert_eq!(cfg.max_len, 15);
        assert_eq!(cfg.beta_2, 0.999);
        assert_eq!(cfg.align_to, Modality::Text);
        assert_eq!(cfg.loss_weights().valence_l2, 0.0);
    }

    #[test]
    fn test_align_to_and_valence_l2_flags() {
        let cli = Cli::try_parse_from([
            "mosi-mtl", "train", "--align-to", "covarep", "--valence-l2", "0.05",
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.align_to, Modality::Audio);
        assert_eq!(cfg.valence_l2, Some(0.05));
    }

    #[test]
    fn test_unknown_modality_is_rejected() {
        assert!(Cli::try_parse_from(["mosi-mtl", "train", "--modalities", "smell"]).is_err());
    }

    #[test]
    fn test_predict_overrides_are_optional() {
        let cli = Cli::try_parse_from(["mosi-mtl", "predict", "--run-tag", "again"]).unwrap();
        let Commands::Predict(args) = cli.command else { panic!("expected predict") };
        let cfg: PredictConfig = args.into();
        assert_eq!(cfg.checkpoint_dir, "checkpoints");
        assert_eq!(cfg.run_tag.as_deref(), Some("again"));
        assert!(cfg.data_dir.is_none());
    }
}
