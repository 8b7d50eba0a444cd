// ============================================================
// Layer 6 — Checkpoint Policy and Manager
// ============================================================
// Keeps exactly one checkpoint per run: the model with the best
// validation accuracy seen so far.
//
// Policy (a two-state machine):
//
//   NotSaved ──(acc >= 0)──────────▶ Saved { acc }
//   Saved { best } ──(acc >= best)─▶ Saved { acc }   (overwrite)
//   Saved { best } ──(acc <  best)─▶ Saved { best }  (no I/O)
//
// Ties count as improvements, so a later model with the same
// accuracy replaces an earlier one.
//
// Files in the run directory:
//   model.*            ← model parameters (CompactRecorder)
//   checkpoint.json    ← epoch, accuracy, architecture, image size
//   train_config.json  ← full training configuration
//
// Reference: Burn Book §5 (Records and Checkpointing)

use std::{fs, path::{Path, PathBuf}};

use anyhow::{bail, Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use serde::{Deserialize, Serialize};

use crate::application::train_use_case::TrainConfig;
use crate::domain::sample::Architecture;

// ─── CheckpointState ──────────────────────────────────────────────────────────
/// Best-accuracy record for one process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CheckpointState {
    #[default]
    NotSaved,
    Saved { epoch: usize, accuracy: f64 },
}

impl CheckpointState {
    /// Best accuracy so far; 0 before the first save
    pub fn best(&self) -> f64 {
        match self {
            CheckpointState::NotSaved               => 0.0,
            CheckpointState::Saved { accuracy, .. } => *accuracy,
        }
    }

    /// Epoch of the saved checkpoint, if any
    pub fn best_epoch(&self) -> Option<usize> {
        match self {
            CheckpointState::NotSaved            => None,
            CheckpointState::Saved { epoch, .. } => Some(*epoch),
        }
    }

    /// Whether a new accuracy earns a save (improvement or tie)
    pub fn admits(&self, accuracy: f64) -> bool {
        accuracy >= self.best()
    }

    /// Move to Saved if admitted. Returns whether the state changed.
    pub fn advance(&mut self, epoch: usize, accuracy: f64) -> bool {
        if !self.admits(accuracy) {
            return false;
        }
        *self = CheckpointState::Saved { epoch, accuracy };
        true
    }
}

// ─── CheckpointRecord ─────────────────────────────────────────────────────────
/// Companion metadata written next to the model parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub epoch:        usize,
    pub accuracy:     f64,
    pub architecture: Architecture,
    pub image_size:   usize,
}

// ─── CheckpointManager ────────────────────────────────────────────────────────
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir: dir.to_path_buf() })
    }

    /// Open a finished run for reading. Never creates the directory.
    pub fn open_existing(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            bail!("Run directory '{}' does not exist. Have you run 'train' first?", dir.display());
        }
        let manager = Self { dir: dir.to_path_buf() };
        if !manager.has_model() {
            bail!("No saved model in '{}'. Have you run 'train' first?", dir.display());
        }
        Ok(manager)
    }

    /// Model path without extension; the recorder appends its own
    fn model_path(&self) -> PathBuf {
        self.dir.join("model")
    }

    fn record_path(&self) -> PathBuf {
        self.dir.join("checkpoint.json")
    }

    /// Overwrite the single checkpoint with these parameters.
    pub fn save_model<B: Backend, M: Module<B>>(
        &self,
        model:  &M,
        record: &CheckpointRecord,
    ) -> Result<()> {
        let path = self.model_path();

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| {
                format!("Failed to save checkpoint to '{}'", path.display())
            })?;

        fs::write(self.record_path(), serde_json::to_string_pretty(record)?)
            .with_context(|| format!("Failed to write '{}'", self.record_path().display()))?;

        tracing::debug!("Saved checkpoint: epoch {} acc {:.4}", record.epoch, record.accuracy);
        Ok(())
    }

    /// Restore saved parameters into a model of the same architecture.
    pub fn load_model<B: Backend, M: Module<B>>(&self, model: M, device: &B::Device) -> Result<M> {
        let path = self.model_path();

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display())
            })?;

        Ok(model.load_record(record))
    }

    pub fn load_record(&self) -> Result<CheckpointRecord> {
        let path = self.record_path();
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'. Have you run 'train' first?", path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Save the training configuration to JSON before training starts.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join("train_config.json");
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Whether a model parameter file exists in the run directory
    pub fn has_model(&self) -> bool {
        fs::read_dir(&self.dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .any(|e| e.file_name().to_string_lossy().starts_with("model."))
            })
            .unwrap_or(false)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::nn::{Linear, LinearConfig};

    type TestBackend = NdArray;

    #[test]
    fn test_first_epoch_always_saves() {
        let mut state = CheckpointState::default();
        assert!(state.advance(1, 0.0));
        assert_eq!(state, CheckpointState::Saved { epoch: 1, accuracy: 0.0 });
    }

    #[test]
    fn test_ties_save_and_drops_do_not() {
        let mut state = CheckpointState::default();
        assert!(state.advance(1, 0.6));
        assert!(state.advance(2, 0.6));
        assert!(!state.advance(3, 0.4));
        assert_eq!(state, CheckpointState::Saved { epoch: 2, accuracy: 0.6 });
    }

    #[test]
    fn test_best_is_monotonic() {
        let mut state = CheckpointState::default();
        let mut previous = state.best();
        for (epoch, acc) in [0.3, 0.7, 0.5, 0.7, 0.9, 0.1].into_iter().enumerate() {
            state.advance(epoch + 1, acc);
            assert!(state.best() >= previous);
            previous = state.best();
        }
        assert_eq!(state.best(), 0.9);
        assert_eq!(state.best_epoch(), Some(5));
    }

    #[test]
    fn test_no_best_epoch_before_first_save() {
        assert_eq!(CheckpointState::default().best_epoch(), None);
    }

    #[test]
    fn test_open_existing_never_creates_directory() {
        let dir     = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent");

        assert!(CheckpointManager::open_existing(&missing).is_err());
        assert!(!missing.exists());
    }

    #[test]
    fn test_open_existing_requires_a_model() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CheckpointManager::open_existing(dir.path()).is_err());

        let model: Linear<TestBackend> = LinearConfig::new(4, 2).init(&Default::default());
        let record = CheckpointRecord {
            epoch:        1,
            accuracy:     0.5,
            architecture: Architecture::ResNet18,
            image_size:   32,
        };
        CheckpointManager::new(dir.path()).unwrap().save_model(&model, &record).unwrap();

        let manager = CheckpointManager::open_existing(dir.path()).unwrap();
        assert_eq!(manager.load_record().unwrap(), record);
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir     = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path()).unwrap();
        let device  = Default::default();

        let model: Linear<TestBackend> = LinearConfig::new(4, 2).init(&device);
        let record = CheckpointRecord {
            epoch:        3,
            accuracy:     0.75,
            architecture: Architecture::ResNet18,
            image_size:   32,
        };
        assert!(!manager.has_model());
        manager.save_model(&model, &record).unwrap();

        assert!(manager.has_model());
        assert_eq!(manager.load_record().unwrap(), record);

        let fresh: Linear<TestBackend> = LinearConfig::new(4, 2).init(&device);
        let loaded = manager.load_model(fresh, &device).unwrap();
        loaded
            .weight
            .val()
            .into_data()
            .assert_approx_eq(&model.weight.val().into_data(), 2);
    }
}
