// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Epochs 1..=N, strictly in order. Each epoch:
//
//   train_epoch   → one optimiser update per batch,
//                   progress record every 5th batch
//   evaluate      → accuracy over the whole validation set
//   checkpoint    → save if accuracy >= best so far
//
// After the last epoch the best accuracy is reported once.
//
// Key Burn insight:
//   - Training uses an AutodiffBackend for gradients
//   - model.valid() returns the model on the inner backend, so
//     evaluation builds no graph and BatchNorm uses running stats
//   - Validation batcher must also use the inner backend
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::{bail, Result};
use burn::{
    backend::wgpu::WgpuDevice,
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    optim::{decay::WeightDecayConfig, AdamConfig, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{ImageBatch, ImageBatcher},
    dataset::ImageDataset,
};
use crate::infra::run_context::RunContext;
use crate::ml::{
    model::{create_classifier, ResNet},
    step::{count_correct, ParallelStep},
};

type MyBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// Progress is reported on every LOG_INTERVAL-th batch, starting at 0
const LOG_INTERVAL: usize = 5;

// ─── Records ──────────────────────────────────────────────────────────────────
/// One training progress record.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressRecord {
    pub epoch:       usize,
    pub batch_idx:   usize,
    /// Samples in the current batch
    pub batch_len:   usize,
    pub dataset_len: usize,
    pub num_batches: usize,
    pub loss:        f64,
    pub correct:     usize,
    /// Accuracy denominator: the configured batch size, even when
    /// the last batch is shorter
    pub window:      usize,
}

impl ProgressRecord {
    pub fn message(&self) -> String {
        format!(
            "Train Epoch: {} [{}/{} ({:.0}%)]\tLoss: {:.6}\tAccuracy: {}/{} ({:.0}%)",
            self.epoch,
            self.batch_idx * self.batch_len,
            self.dataset_len,
            100.0 * self.batch_idx as f64 / self.num_batches.max(1) as f64,
            self.loss,
            self.correct,
            self.window,
            100.0 * self.window_accuracy(),
        )
    }

    pub fn global_step(&self) -> usize {
        self.epoch * self.num_batches + self.batch_idx
    }

    pub fn window_accuracy(&self) -> f64 {
        if self.window == 0 { 0.0 } else { self.correct as f64 / self.window as f64 }
    }
}

/// Correct / total over one full validation pass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EvalSummary {
    pub correct: usize,
    pub total:   usize,
}

impl EvalSummary {
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 { 0.0 } else { self.correct as f64 / self.total as f64 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpochReport {
    pub epoch:    usize,
    pub accuracy: f64,
    /// Whether this epoch overwrote the checkpoint
    pub saved:    bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunSummary {
    pub epochs:        Vec<EpochReport>,
    pub best_accuracy: f64,
}

impl RunSummary {
    /// Epoch whose model is on disk: the last one that saved
    pub fn checkpoint_epoch(&self) -> Option<usize> {
        self.epochs.iter().rev().find(|r| r.saved).map(|r| r.epoch)
    }
}

// ─── Entry points ─────────────────────────────────────────────────────────────
pub fn run_training(
    cfg:      &TrainConfig,
    train_ds: ImageDataset,
    val_ds:   ImageDataset,
    ctx:      &mut RunContext,
) -> Result<RunSummary> {
    let devices = wgpu_devices(cfg.num_devices);
    tracing::info!("Using WGPU device(s): {:?}", devices);
    train_loop::<MyBackend>(cfg, train_ds, val_ds, devices, ctx)
}

fn wgpu_devices(count: usize) -> Vec<WgpuDevice> {
    if count <= 1 {
        vec![WgpuDevice::default()]
    } else {
        (0..count).map(WgpuDevice::DiscreteGpu).collect()
    }
}

pub fn train_loop<B: AutodiffBackend>(
    cfg:      &TrainConfig,
    train_ds: ImageDataset,
    val_ds:   ImageDataset,
    devices:  Vec<B::Device>,
    ctx:      &mut RunContext,
) -> Result<RunSummary> {
    let step = ParallelStep::<B>::new(devices)?;
    if step.device_count() > 1 {
        ctx.log.info(&format!("Using {} GPUs!", step.device_count()))?;
    }
    let device = step.primary().clone();

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: ResNet<B> =
        create_classifier(cfg.model, cfg.pretrained, &cfg.weights_dir, &device)?;

    // ── Adam optimiser ────────────────────────────────────────────────────────
    // m = β1*m + (1-β1)*g        (mean)
    // v = β2*v + (1-β2)*g²       (variance)
    // θ = θ - lr * m / (√v + ε)  (update)
    let mut optim = AdamConfig::new()
        .with_epsilon(1e-8)
        .with_weight_decay(Some(WeightDecayConfig::new(1e-6)))
        .init::<B, ResNet<B>>();

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let seed = cfg.seed.unwrap_or_else(rand::random);
    tracing::debug!("Shuffle seed: {seed}");

    let train_loader = DataLoaderBuilder::new(ImageBatcher::<B>::new(device.clone(), cfg.image_size))
        .batch_size(cfg.batch_size)
        .shuffle(seed)
        .num_workers(cfg.num_workers)
        .build(train_ds);

    // ── Validation data loader (InnerBackend, no autodiff overhead) ───────────
    let val_loader =
        DataLoaderBuilder::new(ImageBatcher::<B::InnerBackend>::new(device, cfg.image_size))
            .batch_size(cfg.batch_size)
            .num_workers(cfg.num_workers)
            .build(val_ds);

    // ── Epoch loop ────────────────────────────────────────────────────────────
    let mut summary = RunSummary::default();

    for epoch in 1..=cfg.num_epochs {
        model = train_epoch(epoch, model, &mut optim, &step, train_loader.as_ref(), cfg, ctx)?;

        let eval = evaluate(&model.valid(), val_loader.as_ref())?;
        ctx.report_evaluation(epoch, &eval)?;

        let saved = ctx.checkpoint_if_improved::<B, ResNet<B>>(epoch, eval.accuracy(), &model)?;
        summary.epochs.push(EpochReport { epoch, accuracy: eval.accuracy(), saved });
    }

    summary.best_accuracy = ctx.report_best()?;
    tracing::info!("Training complete!");
    Ok(summary)
}

/// One pass over the training set. Returns the updated model.
fn train_epoch<B, O>(
    epoch:     usize,
    mut model: ResNet<B>,
    optim:     &mut O,
    step:      &ParallelStep<B>,
    loader:    &dyn DataLoader<ImageBatch<B>>,
    cfg:       &TrainConfig,
    ctx:       &RunContext,
) -> Result<ResNet<B>>
where
    B: AutodiffBackend,
    O: Optimizer<ResNet<B>, B>,
{
    let dataset_len = loader.num_items();
    let num_batches = dataset_len.div_ceil(cfg.batch_size);
    let mut seen    = 0usize;

    for (batch_idx, batch) in loader.iter().enumerate() {
        let batch_len = batch.len();
        seen += batch_len;

        // Gradients are fresh per step; nothing carries over
        let (output, grads) = step.forward_backward(&model, batch);
        model = optim.step(cfg.lr, model, grads);

        if batch_idx % LOG_INTERVAL == 0 {
            ctx.report_progress(&ProgressRecord {
                epoch,
                batch_idx,
                batch_len,
                dataset_len,
                num_batches,
                loss:    output.loss,
                correct: output.correct,
                window:  cfg.batch_size,
            })?;
        }
    }

    if seen != dataset_len {
        bail!(
            "Epoch {epoch} saw {seen} of {dataset_len} training samples; \
             an image failed to decode (see errors above)"
        );
    }
    Ok(model)
}

/// Accuracy of a frozen model over every batch the loader yields.
pub fn evaluate<B: Backend>(
    model:  &ResNet<B>,
    loader: &dyn DataLoader<ImageBatch<B>>,
) -> Result<EvalSummary> {
    let mut summary = EvalSummary::default();

    for batch in loader.iter() {
        summary.total += batch.len();
        let scores = model.forward(batch.images);
        summary.correct += count_correct(scores, batch.targets);
    }

    let expected = loader.num_items();
    if summary.total != expected {
        bail!(
            "Evaluation saw {} of {expected} validation samples; \
             an image failed to decode (see errors above)",
            summary.total
        );
    }
    Ok(summary)
}
