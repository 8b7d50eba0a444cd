// ============================================================
// Layer 6 — Run Context
// ============================================================
// Everything a training run writes to, bundled into one value
// that the epoch loop passes to each step:
//
//   log          → <save_dir>/log          (human-readable)
//   metrics      → <save_dir>/scalars.csv  (scalar series)
//   checkpoints  → <save_dir>/model.*      (best model only)
//   best         → best-accuracy record, starts at NotSaved
//
// No step reaches for a global logger or a global best score;
// a second run in the same process starts from a fresh context.

use std::path::Path;

use anyhow::Result;
use burn::prelude::*;

use crate::domain::sample::Architecture;
use crate::infra::{
    checkpoint::{CheckpointManager, CheckpointRecord, CheckpointState},
    metrics::{MetricsWriter, ACCURACY_TEST, ACCURACY_TRAIN, LOSS_TRAIN},
    run_log::RunLog,
};
use crate::ml::trainer::{EvalSummary, ProgressRecord};

pub struct RunContext {
    pub log:         RunLog,
    pub metrics:     MetricsWriter,
    pub checkpoints: CheckpointManager,
    pub best:        CheckpointState,
    architecture:    Architecture,
    image_size:      usize,
}

impl RunContext {
    pub fn create(save_dir: &Path, architecture: Architecture, image_size: usize) -> Result<Self> {
        Ok(Self {
            log:         RunLog::open(save_dir)?,
            metrics:     MetricsWriter::new(save_dir)?,
            checkpoints: CheckpointManager::new(save_dir)?,
            best:        CheckpointState::default(),
            architecture,
            image_size,
        })
    }

    /// One training progress record → log line + two scalars.
    pub fn report_progress(&self, p: &ProgressRecord) -> Result<()> {
        self.log.info(&p.message())?;
        self.metrics.add_scalar(LOSS_TRAIN, p.loss, p.global_step())?;
        self.metrics.add_scalar(ACCURACY_TRAIN, p.window_accuracy(), p.global_step())?;
        Ok(())
    }

    /// One validation summary → log line + one scalar.
    pub fn report_evaluation(&self, epoch: usize, s: &EvalSummary) -> Result<()> {
        self.log.info(&format!(
            "Test set: Accuracy: {}/{} ({:.4}%)",
            s.correct,
            s.total,
            100.0 * s.accuracy()
        ))?;
        self.metrics.add_scalar(ACCURACY_TEST, s.accuracy(), epoch * s.total)?;
        Ok(())
    }

    /// Apply the checkpoint policy after an epoch's evaluation.
    /// Saves the model and returns true when accuracy >= best so far.
    pub fn checkpoint_if_improved<B: Backend, M: Module<B>>(
        &mut self,
        epoch:    usize,
        accuracy: f64,
        model:    &M,
    ) -> Result<bool> {
        if !self.best.admits(accuracy) {
            return Ok(false);
        }

        let record = CheckpointRecord {
            epoch,
            accuracy,
            architecture: self.architecture,
            image_size:   self.image_size,
        };
        self.checkpoints.save_model::<B, M>(model, &record)?;
        self.best.advance(epoch, accuracy);

        self.log.info(&format!("Saved model with Acc: {accuracy:.4}"))?;
        Ok(true)
    }

    /// Final report, once per run.
    pub fn report_best(&self) -> Result<f64> {
        let best = self.best.best();
        self.log.info(&format!("Best Acc: {best:.4}"))?;
        if let Some(epoch) = self.best.best_epoch() {
            tracing::info!("Best checkpoint from epoch {epoch}");
        }
        Ok(best)
    }
}
