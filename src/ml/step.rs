// ============================================================
// Layer 5 — Forward/Backward Step
// ============================================================
// One forward + backward pass over a batch, returning the loss,
// the number of correct predictions, and the gradients.
//
// With one device this is a plain step. With several devices
// the batch is chunked along the batch axis and each chunk runs
// on its own model replica:
//
//   batch [N] ──chunk──▶ [n0] on dev0, [n1] on dev1, ...
//   loss_i weighted by n_i / N
//   grads_i moved to dev0, summed
//
// The caller applies one optimiser update with the summed
// gradients. BatchNorm statistics are computed per replica on
// its own chunk, so the loss, the correct count and the
// gradients differ from a single-device step over the whole
// batch.
//
// Reference: Burn Book §5 (Custom Training Loop)

use anyhow::{bail, Result};
use burn::{
    nn::loss::CrossEntropyLossConfig,
    optim::{GradientsAccumulator, GradientsParams},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::batcher::ImageBatch;
use crate::ml::model::ResNet;

#[derive(Debug, Clone, Copy, Default)]
pub struct StepOutput {
    /// Mean cross-entropy over the batch
    pub loss:    f64,
    /// Top-1 correct predictions in the batch
    pub correct: usize,
}

/// Count rows whose arg-max class equals the target.
pub fn count_correct<B: Backend>(scores: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> usize {
    // argmax(1) returns [batch, 1]; flatten to [batch] before comparing
    let predicted = scores.argmax(1).flatten::<1>(0, 1);
    predicted
        .equal(targets)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>() as usize
}

pub struct ParallelStep<B: AutodiffBackend> {
    devices: Vec<B::Device>,
}

impl<B: AutodiffBackend> ParallelStep<B> {
    pub fn new(devices: Vec<B::Device>) -> Result<Self> {
        if devices.is_empty() {
            bail!("at least one compute device is required");
        }
        Ok(Self { devices })
    }

    /// Device that owns the parameters and the optimiser state
    pub fn primary(&self) -> &B::Device {
        &self.devices[0]
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn forward_backward(
        &self,
        model: &ResNet<B>,
        batch: ImageBatch<B>,
    ) -> (StepOutput, GradientsParams) {
        if self.devices.len() == 1 {
            return shard_step(model, batch.images, batch.targets, 1.0);
        }

        let total   = batch.len();
        let shards  = self.devices.len().min(total);
        let images  = batch.images.chunk(shards, 0);
        let targets = batch.targets.chunk(shards, 0);

        let mut accumulator = GradientsAccumulator::<ResNet<B>>::new();
        let mut output      = StepOutput::default();

        for ((images, targets), device) in images.into_iter().zip(targets).zip(&self.devices) {
            let weight  = targets.dims()[0] as f64 / total as f64;
            let replica = model.clone().fork(device);

            let (part, grads) = shard_step(
                &replica,
                images.to_device(device),
                targets.to_device(device),
                weight,
            );

            let grads = grads.to_device::<B, ResNet<B>>(self.primary(), model);
            accumulator.accumulate::<B>(model, grads);
            output.loss    += part.loss;
            output.correct += part.correct;
        }

        (output, accumulator.grads())
    }
}

/// Forward + backward on one shard with its loss scaled by `weight`.
fn shard_step<B: AutodiffBackend>(
    model:   &ResNet<B>,
    images:  Tensor<B, 4>,
    targets: Tensor<B, 1, Int>,
    weight:  f64,
) -> (StepOutput, GradientsParams) {
    let scores = model.forward(images);
    let loss = CrossEntropyLossConfig::new()
        .init(&scores.device())
        .forward(scores.clone(), targets.clone())
        .mul_scalar(weight);

    let correct  = count_correct(scores, targets);
    let loss_val = loss.clone().into_scalar().elem::<f64>();

    let grads = GradientsParams::from_grads(loss.backward(), model);
    (StepOutput { loss: loss_val, correct }, grads)
}
