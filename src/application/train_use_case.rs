// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Validate the configuration        (Layer 2)
//   Step 2: Read the sample table             (Layer 4 - data)
//   Step 3: Load the cluster partition        (Layer 4 - data)
//   Step 4: Split train/validation by cluster (Layer 4 - data)
//   Step 5: Build datasets                    (Layer 4 - data)
//   Step 6: Open run outputs, save config     (Layer 6 - infra)
//   Step 7: Run training loop                 (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use std::path::PathBuf;

use anyhow::{bail, Result};
use burn::tensor::backend::AutodiffBackend;
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::ImageDataset,
    splitter::{load_partition, split_by_cluster},
    table::CsvSampleTable,
};
use crate::domain::{
    sample::{Architecture, LabelField},
    traits::SampleSource,
};
use crate::infra::run_context::RunContext;
use crate::ml::trainer::{run_training, train_loop, RunSummary};

// ─── Training Configuration ──────────────────────────────────────────────────
// All settings for a training run.
// Serialisable so it can be saved to disk and reloaded by `eval`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub model:          Architecture,
    /// Run output directory
    pub save_name:      PathBuf,
    pub label:          LabelField,
    pub lr:             f64,
    pub batch_size:     usize,
    pub num_epochs:     usize,
    pub pretrained:     bool,
    pub data_csv:       PathBuf,
    pub train_clusters: PathBuf,
    pub val_clusters:   PathBuf,
    pub image_column:   String,
    pub cluster_column: String,
    pub image_size:     usize,
    pub num_workers:    usize,
    pub num_devices:    usize,
    pub weights_dir:    PathBuf,
    /// Shuffle seed; None draws a fresh one per run
    pub seed:           Option<u64>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            model:          Architecture::ResNet34,
            save_name:      PathBuf::from("models/class_pov"),
            label:          LabelField::PovLabel,
            lr:             1e-3,
            batch_size:     256,
            num_epochs:     100,
            pretrained:     false,
            data_csv:       PathBuf::from("data/final_data_200.csv"),
            train_clusters: PathBuf::from("data/train_clusters_ke.txt"),
            val_clusters:   PathBuf::from("data/val_clusters_ke.txt"),
            image_column:   "img_path_224x224".to_string(),
            cluster_column: "unique_cluster".to_string(),
            image_size:     224,
            num_workers:    2,
            num_devices:    1,
            weights_dir:    PathBuf::from("weights"),
            seed:           None,
        }
    }
}

impl TrainConfig {
    /// Reject settings that would fail deep inside the loop.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            bail!("batch size must be at least 1");
        }
        if self.num_workers == 0 {
            bail!("number of workers must be at least 1");
        }
        if self.num_devices == 0 {
            bail!("number of devices must be at least 1");
        }
        if self.image_size == 0 {
            bail!("image size must be positive");
        }
        if !(self.lr.is_finite() && self.lr > 0.0) {
            bail!("learning rate must be a positive number, got {}", self.lr);
        }
        Ok(())
    }

    /// Read the table and partition, returning (train, validation) datasets.
    pub fn build_datasets(&self) -> Result<(ImageDataset, ImageDataset)> {
        let table = CsvSampleTable::new(
            &self.data_csv,
            &self.image_column,
            &self.cluster_column,
            self.label,
        );
        let samples = table.load_all()?;

        let partition = load_partition(&self.train_clusters, &self.val_clusters)?;
        let (train, val) = split_by_cluster(samples, &partition)?;

        Ok((
            ImageDataset::new(train, self.image_size),
            ImageDataset::new(val, self.image_size),
        ))
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

    /// Execute the full training pipeline on the GPU backend
    pub fn execute(&self) -> Result<RunSummary> {
        let (cfg, train_dataset, val_dataset, mut ctx) = self.prepare()?;
        run_training(cfg, train_dataset, val_dataset, &mut ctx)
    }

    /// Same pipeline on any autodiff backend and explicit devices.
    pub fn execute_with<B: AutodiffBackend>(&self, devices: Vec<B::Device>) -> Result<RunSummary> {
        let (cfg, train_dataset, val_dataset, mut ctx) = self.prepare()?;
        train_loop::<B>(cfg, train_dataset, val_dataset, devices, &mut ctx)
    }

    fn prepare(&self) -> Result<(&TrainConfig, ImageDataset, ImageDataset, RunContext)> {
        let cfg = &self.config;
        cfg.validate()?;

        let (train_dataset, val_dataset) = cfg.build_datasets()?;
        tracing::info!(
            "Datasets ready: {} train, {} validation images",
            train_dataset.sample_count(),
            val_dataset.sample_count()
        );

        // Saved up front so `eval` can rebuild the model even if the run dies
        let ctx = RunContext::create(&cfg.save_name, cfg.model, cfg.image_size)?;
        ctx.checkpoints.save_config(cfg)?;

        Ok((cfg, train_dataset, val_dataset, ctx))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::{fs, path::Path};

    use burn::backend::{Autodiff, NdArray};
    use image::{Rgb, RgbImage};

    use crate::infra::{checkpoint::CheckpointManager, metrics::tests::read_events};

    type TestBackend = Autodiff<NdArray>;

    /// Ten 32x32 images in clusters c0..c9; c0-c4 train, c5-c9 validate.
    pub(crate) fn write_fixture(root: &Path) -> TrainConfig {
        let images = root.join("images");
        fs::create_dir_all(&images).unwrap();

        let mut csv = String::from("img_path_224x224,unique_cluster,pov_label,pop_label,bmi_label\n");
        for i in 0..10 {
            let path  = images.join(format!("{i}.png"));
            let shade = (i * 25) as u8;
            RgbImage::from_pixel(32, 32, Rgb([shade, 128, 255 - shade])).save(&path).unwrap();
            csv.push_str(&format!("{},c{i},{},0,1\n", path.display(), i % 2));
        }
        fs::write(root.join("samples.csv"), csv).unwrap();
        fs::write(root.join("train.txt"), "c0\nc1\nc2\nc3\nc4\n").unwrap();
        fs::write(root.join("val.txt"), "c5\nc6\nc7\nc8\nc9\n").unwrap();

        TrainConfig {
            model:          Architecture::ResNet18,
            save_name:      root.join("run"),
            batch_size:     4,
            num_epochs:     2,
            data_csv:       root.join("samples.csv"),
            train_clusters: root.join("train.txt"),
            val_clusters:   root.join("val.txt"),
            image_size:     32,
            num_workers:    1,
            weights_dir:    root.join("weights"),
            seed:           Some(7),
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(TrainConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let cfg = TrainConfig { batch_size: 0, ..TrainConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_overlapping_cluster_lists_fail_before_training() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = write_fixture(dir.path());
        fs::write(&cfg.val_clusters, "c4\nc5\n").unwrap();

        let result = TrainUseCase::new(cfg.clone()).execute_with::<TestBackend>(vec![Default::default()]);
        assert!(result.is_err());
        assert!(!cfg.save_name.join("log").exists());
    }

    #[test]
    fn test_end_to_end_two_epochs() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = write_fixture(dir.path());

        let summary = TrainUseCase::new(cfg.clone())
            .execute_with::<TestBackend>(vec![Default::default()])
            .unwrap();

        // Exactly one evaluation record per epoch
        let log = fs::read_to_string(cfg.save_name.join("log")).unwrap();
        assert_eq!(log.lines().filter(|l| l.contains("Test set: Accuracy: ")).count(), 2);
        assert!(log.lines().any(|l| l.contains("Train Epoch: 1 [0/5 (0%)]")));
        assert_eq!(log.lines().filter(|l| l.contains("Best Acc: ")).count(), 1);

        // Checkpoint holds the best epoch
        let manager = CheckpointManager::new(&cfg.save_name).unwrap();
        assert!(manager.has_model());
        let best = summary.epochs.iter().map(|e| e.accuracy).fold(0.0, f64::max);
        let record = manager.load_record().unwrap();
        assert_eq!(record.accuracy, best);
        assert_eq!(Some(record.epoch), summary.checkpoint_epoch());
        assert_eq!(summary.best_accuracy, best);
        let saved_cfg = manager.load_config().unwrap();
        assert_eq!(saved_cfg.model, cfg.model);
        assert_eq!(saved_cfg.image_size, cfg.image_size);
        assert_eq!(saved_cfg.val_clusters, cfg.val_clusters);

        // Saved exactly when accuracy >= best so far
        let mut running = 0.0;
        for report in &summary.epochs {
            assert!((0.0..=1.0).contains(&report.accuracy));
            assert_eq!(report.saved, report.accuracy >= running);
            running = f64::max(running, report.accuracy);
        }
        assert!(summary.epochs[0].saved);

        // Two batches per epoch → one progress record each (batch 0); test at epoch * 5
        let events = read_events(&cfg.save_name.join("scalars.csv"));
        let test_steps: Vec<usize> = events
            .iter()
            .filter(|e| e.tag == "Accuracy/test")
            .map(|e| e.step)
            .collect();
        assert_eq!(test_steps, vec![5, 10]);
        let loss_steps: Vec<usize> = events
            .iter()
            .filter(|e| e.tag == "Loss/train")
            .map(|e| e.step)
            .collect();
        assert_eq!(loss_steps, vec![2, 4]);
    }
}
