// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `train` and `eval`
// and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, Architecture, ...)
//
// Architecture and label names are parsed through their FromStr
// impls, so a bad value is rejected before any work begins.
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::application::{eval_use_case::EvalOverrides, train_use_case::TrainConfig};
use crate::domain::sample::{Architecture, LabelField};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a classifier and keep the best checkpoint
    Train(TrainArgs),

    /// Evaluate a saved checkpoint on the validation clusters
    Eval(EvalArgs),
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Backbone: resnet18 or resnet34
    #[arg(long, default_value = "resnet34")]
    pub model: Architecture,

    /// Run directory for the log, metrics and checkpoint
    #[arg(long, default_value = "models/class_pov")]
    pub save_name: PathBuf,

    /// Target column: pov_label, pop_label or bmi_label
    #[arg(long, default_value = "pov_label")]
    pub label: LabelField,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    #[arg(long, default_value_t = 256)]
    pub batch_size: usize,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 100)]
    pub num_epochs: usize,

    /// Start from ImageNet weights in --weights-dir
    #[arg(long)]
    pub pretrained: bool,

    /// CSV sample table
    #[arg(long, default_value = "data/final_data_200.csv")]
    pub data_csv: PathBuf,

    /// Training cluster ids, one per line
    #[arg(long, default_value = "data/train_clusters_ke.txt")]
    pub train_clusters: PathBuf,

    /// Validation cluster ids, one per line
    #[arg(long, default_value = "data/val_clusters_ke.txt")]
    pub val_clusters: PathBuf,

    #[arg(long, default_value = "img_path_224x224")]
    pub image_column: String,

    #[arg(long, default_value = "unique_cluster")]
    pub cluster_column: String,

    /// Images are resized to this height and width
    #[arg(long, default_value_t = 224)]
    pub image_size: usize,

    /// Image decoding threads
    #[arg(long, default_value_t = 2)]
    pub num_workers: usize,

    /// GPUs to split each batch across
    #[arg(long, default_value_t = 1)]
    pub num_devices: usize,

    #[arg(long, default_value = "weights")]
    pub weights_dir: PathBuf,

    /// Shuffle seed (random when omitted)
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            model:          a.model,
            save_name:      a.save_name,
            label:          a.label,
            lr:             a.lr,
            batch_size:     a.batch_size,
            num_epochs:     a.num_epochs,
            pretrained:     a.pretrained,
            data_csv:       a.data_csv,
            train_clusters: a.train_clusters,
            val_clusters:   a.val_clusters,
            image_column:   a.image_column,
            cluster_column: a.cluster_column,
            image_size:     a.image_size,
            num_workers:    a.num_workers,
            num_devices:    a.num_devices,
            weights_dir:    a.weights_dir,
            seed:           a.seed,
        }
    }
}

/// All arguments for the `eval` command.
/// Data flags default to the values saved with the run.
#[derive(Args, Debug)]
pub struct EvalArgs {
    /// Run directory written by `train`
    #[arg(long, default_value = "models/class_pov")]
    pub save_name: PathBuf,

    #[arg(long)]
    pub data_csv: Option<PathBuf>,

    #[arg(long)]
    pub val_clusters: Option<PathBuf>,

    #[arg(long)]
    pub batch_size: Option<usize>,
}

impl EvalArgs {
    pub fn overrides(&self) -> EvalOverrides {
        EvalOverrides {
            data_csv:     self.data_csv.clone(),
            val_clusters: self.val_clusters.clone(),
            batch_size:   self.batch_size,
        }
    }
}
