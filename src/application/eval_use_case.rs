// ============================================================
// Layer 2 — EvalUseCase
// ============================================================
// Re-runs the evaluation step on a finished run:
//
//   Step 1: Load train_config.json + checkpoint.json  (Layer 6)
//   Step 2: Rebuild the classifier, load weights      (Layer 5)
//   Step 3: Rebuild the validation dataset            (Layer 4)
//   Step 4: Evaluate over the whole validation set    (Layer 5)
//
// The model is frozen, so repeated runs give the same accuracy.

use std::path::PathBuf;

use anyhow::Result;
use burn::{
    backend::{wgpu::WgpuDevice, Wgpu},
    data::dataloader::DataLoaderBuilder,
    prelude::*,
};

use crate::data::batcher::ImageBatcher;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    model::{ResNet, ResNetConfig, NUM_CLASSES},
    trainer::{evaluate, EvalSummary},
};

/// Settings that may differ from the ones the run was trained with.
#[derive(Debug, Clone, Default)]
pub struct EvalOverrides {
    pub data_csv:     Option<PathBuf>,
    pub val_clusters: Option<PathBuf>,
    pub batch_size:   Option<usize>,
}

pub struct EvalUseCase {
    save_dir:  PathBuf,
    overrides: EvalOverrides,
}

impl EvalUseCase {
    pub fn new(save_dir: impl Into<PathBuf>, overrides: EvalOverrides) -> Self {
        Self { save_dir: save_dir.into(), overrides }
    }

    pub fn execute(&self) -> Result<EvalSummary> {
        self.execute_with::<Wgpu>(&WgpuDevice::default())
    }

    pub fn execute_with<B: Backend>(&self, device: &B::Device) -> Result<EvalSummary> {
        let manager = CheckpointManager::open_existing(&self.save_dir)?;
        let record  = manager.load_record()?;

        let mut cfg = manager.load_config()?;
        if let Some(path) = &self.overrides.data_csv {
            cfg.data_csv = path.clone();
        }
        if let Some(path) = &self.overrides.val_clusters {
            cfg.val_clusters = path.clone();
        }
        if let Some(n) = self.overrides.batch_size {
            cfg.batch_size = n;
        }
        cfg.image_size = record.image_size;
        cfg.validate()?;

        let model: ResNet<B> = ResNetConfig::for_architecture(record.architecture)
            .with_num_classes(NUM_CLASSES)
            .init(device);
        let model = manager.load_model::<B, ResNet<B>>(model, device)?;
        tracing::info!(
            "Loaded {} checkpoint from epoch {} (accuracy {:.4})",
            record.architecture,
            record.epoch,
            record.accuracy
        );

        let (_, val_dataset) = cfg.build_datasets()?;
        let loader = DataLoaderBuilder::new(ImageBatcher::<B>::new(device.clone(), cfg.image_size))
            .batch_size(cfg.batch_size)
            .num_workers(cfg.num_workers)
            .build(val_dataset);

        evaluate(&model, loader.as_ref())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    use crate::application::train_use_case::{tests::write_fixture, TrainConfig, TrainUseCase};

    #[test]
    fn test_missing_run_is_an_error() {
        let dir     = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nothing");
        let result  = EvalUseCase::new(missing.clone(), EvalOverrides::default())
            .execute_with::<NdArray>(&Default::default());

        assert!(result.is_err());
        assert!(!missing.exists());
    }

    #[test]
    fn test_frozen_checkpoint_evaluates_identically_twice() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig { num_epochs: 1, ..write_fixture(dir.path()) };
        TrainUseCase::new(cfg.clone())
            .execute_with::<Autodiff<NdArray>>(vec![Default::default()])
            .unwrap();

        let use_case = EvalUseCase::new(&cfg.save_name, EvalOverrides {
            batch_size: Some(3),
            ..EvalOverrides::default()
        });
        let first  = use_case.execute_with::<NdArray>(&Default::default()).unwrap();
        let second = use_case.execute_with::<NdArray>(&Default::default()).unwrap();

        assert_eq!(first.total, 5);
        assert_eq!(first, second);
    }
}
