// ============================================================
// Layer 5 — ResNet Classifier (Model Factory)
// ============================================================
// ResNet-18 and ResNet-34 share one module type; they differ
// only in how many basic blocks each of the four stages holds.
//
//   conv 7x7/2 → bn → relu → maxpool 3x3/2
//   stage 1:  64 channels
//   stage 2: 128 channels, first block stride 2
//   stage 3: 256 channels, first block stride 2
//   stage 4: 512 channels, first block stride 2
//   global average pool → linear 512 → num_classes
//
// The factory returns the same ResNet<B> for both backbones, so
// the training loop never matches on the architecture.
//
// Reference: He et al. (2016) Deep Residual Learning
//            Burn Book §3 (Building Blocks)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Linear, LinearConfig, PaddingConfig2d, Relu,
    },
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::domain::sample::Architecture;

/// Width of the pooled feature vector feeding the head
pub const FEATURES: usize = 512;

/// Output width of the ImageNet head that pretrained records carry
pub const IMAGENET_CLASSES: usize = 1000;

/// Binary task: two class scores
pub const NUM_CLASSES: usize = 2;

const STAGE_CHANNELS: [usize; 4] = [64, 128, 256, 512];

#[derive(Config, Debug)]
pub struct ResNetConfig {
    pub stage_depths: [usize; 4],
    #[config(default = 2)]
    pub num_classes:  usize,
}

impl ResNetConfig {
    pub fn for_architecture(arch: Architecture) -> Self {
        Self::new(arch.stage_depths())
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> ResNet<B> {
        let conv1 = Conv2dConfig::new([3, 64], [7, 7])
            .with_stride([2, 2])
            .with_padding(PaddingConfig2d::Explicit(3, 3))
            .with_bias(false)
            .init(device);
        let bn1 = BatchNormConfig::new(64).init(device);
        let maxpool = MaxPool2dConfig::new([3, 3])
            .with_strides([2, 2])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init();

        let mut blocks   = Vec::new();
        let mut channels = 64;
        for (stage, (&depth, &out)) in self.stage_depths.iter().zip(STAGE_CHANNELS.iter()).enumerate() {
            for i in 0..depth {
                // Stages 2-4 halve the resolution in their first block
                let stride = if stage > 0 && i == 0 { 2 } else { 1 };
                blocks.push(BasicBlock::new(channels, out, stride, device));
                channels = out;
            }
        }

        ResNet {
            conv1,
            bn1,
            maxpool,
            blocks,
            avgpool:    AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            fc:         LinearConfig::new(FEATURES, self.num_classes).init(device),
            activation: Relu::new(),
        }
    }
}

/// 1x1 projection on the skip path when shape changes
#[derive(Module, Debug)]
pub struct Downsample<B: Backend> {
    conv: Conv2d<B>,
    bn:   BatchNorm<B, 2>,
}

#[derive(Module, Debug)]
pub struct BasicBlock<B: Backend> {
    conv1:      Conv2d<B>,
    bn1:        BatchNorm<B, 2>,
    conv2:      Conv2d<B>,
    bn2:        BatchNorm<B, 2>,
    downsample: Option<Downsample<B>>,
    activation: Relu,
}

impl<B: Backend> BasicBlock<B> {
    fn new(in_channels: usize, out_channels: usize, stride: usize, device: &B::Device) -> Self {
        let conv1 = Conv2dConfig::new([in_channels, out_channels], [3, 3])
            .with_stride([stride, stride])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .with_bias(false)
            .init(device);
        let conv2 = Conv2dConfig::new([out_channels, out_channels], [3, 3])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .with_bias(false)
            .init(device);

        let downsample = (stride != 1 || in_channels != out_channels).then(|| Downsample {
            conv: Conv2dConfig::new([in_channels, out_channels], [1, 1])
                .with_stride([stride, stride])
                .with_bias(false)
                .init(device),
            bn: BatchNormConfig::new(out_channels).init(device),
        });

        Self {
            conv1,
            bn1: BatchNormConfig::new(out_channels).init(device),
            conv2,
            bn2: BatchNormConfig::new(out_channels).init(device),
            downsample,
            activation: Relu::new(),
        }
    }

    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let identity = match &self.downsample {
            Some(ds) => ds.bn.forward(ds.conv.forward(x.clone())),
            None     => x.clone(),
        };

        let out = self.activation.forward(self.bn1.forward(self.conv1.forward(x)));
        let out = self.bn2.forward(self.conv2.forward(out));
        self.activation.forward(out + identity)
    }
}

#[derive(Module, Debug)]
pub struct ResNet<B: Backend> {
    conv1:      Conv2d<B>,
    bn1:        BatchNorm<B, 2>,
    maxpool:    MaxPool2d,
    blocks:     Vec<BasicBlock<B>>,
    avgpool:    AdaptiveAvgPool2d,
    fc:         Linear<B>,
    activation: Relu,
}

impl<B: Backend> ResNet<B> {
    /// images: [batch, 3, H, W] → class scores: [batch, num_classes]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.conv1.forward(images);
        let x = self.activation.forward(self.bn1.forward(x));
        let mut x = self.maxpool.forward(x);

        for block in &self.blocks {
            x = block.forward(x);
        }

        let x = self.avgpool.forward(x);
        let [batch, channels, _, _] = x.dims();
        self.fc.forward(x.reshape([batch, channels]))
    }

    /// Replace the classification head with a freshly initialised one.
    pub fn with_head(self, num_classes: usize, device: &B::Device) -> Self {
        Self {
            fc: LinearConfig::new(FEATURES, num_classes).init(device),
            ..self
        }
    }

    #[cfg(test)]
    pub fn num_classes(&self) -> usize {
        self.fc.weight.dims()[1]
    }
}

/// Location of the ImageNet record for a backbone (extension added by the recorder).
pub fn pretrained_path(weights_dir: &Path, arch: Architecture) -> PathBuf {
    weights_dir.join(format!("{}-imagenet", arch.name()))
}

/// Build the 2-way classifier for a backbone.
///
/// With `pretrained`, the ImageNet record is loaded into a
/// 1000-class model first, then the head is swapped out.
pub fn create_classifier<B: Backend>(
    arch:        Architecture,
    pretrained:  bool,
    weights_dir: &Path,
    device:      &B::Device,
) -> Result<ResNet<B>> {
    let config = ResNetConfig::for_architecture(arch);

    if !pretrained {
        tracing::info!("Initialised {} from scratch", arch);
        return Ok(config.with_num_classes(NUM_CLASSES).init(device));
    }

    let path = pretrained_path(weights_dir, arch);
    let record = CompactRecorder::new()
        .load(path.clone(), device)
        .with_context(|| {
            format!("Cannot load pretrained weights '{}'", path.display())
        })?;

    let model = config
        .with_num_classes(IMAGENET_CLASSES)
        .init::<B>(device)
        .load_record(record)
        .with_head(NUM_CLASSES, device);

    tracing::info!("Initialised {} from '{}'", arch, path.display());
    Ok(model)
}
