// ============================================================
// Layer 4 — Image Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<ImageItem>
// into one image tensor and one label tensor.
//
// How batching works here:
//   Input:  N items, each 3 * S * S floats in CHW order
//   Output: images  [N, 3, S, S]
//           targets [N]
//
// The last batch of an epoch may hold fewer than batch_size
// items; nothing here assumes a full batch.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::{ImageItem, CHANNELS};

/// A batch of images ready for the forward pass.
#[derive(Debug, Clone)]
pub struct ImageBatch<B: Backend> {
    /// Pixel values, shape: [batch, 3, size, size]
    pub images: Tensor<B, 4>,

    /// Class indices, shape: [batch]
    pub targets: Tensor<B, 1, Int>,
}

impl<B: Backend> ImageBatch<B> {
    /// Number of samples actually present in this batch
    pub fn len(&self) -> usize {
        self.targets.dims()[0]
    }
}

#[derive(Clone, Debug)]
pub struct ImageBatcher<B: Backend> {
    /// The device to create tensors on
    device:     B::Device,
    image_size: usize,
}

impl<B: Backend> ImageBatcher<B> {
    pub fn new(device: B::Device, image_size: usize) -> Self {
        Self { device, image_size }
    }
}

impl<B: Backend> Batcher<ImageItem, ImageBatch<B>> for ImageBatcher<B> {
    fn batch(&self, items: Vec<ImageItem>) -> ImageBatch<B> {
        let batch_size = items.len();
        let size       = self.image_size;

        let pixels: Vec<f32> = items
            .iter()
            .flat_map(|item| item.pixels.iter().copied())
            .collect();

        let labels: Vec<i32> = items
            .iter()
            .map(|item| item.label as i32)
            .collect();

        let images = Tensor::<B, 1>::from_floats(pixels.as_slice(), &self.device)
            .reshape([batch_size, CHANNELS, size, size]);

        let targets = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        ImageBatch { images, targets }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_batch_shapes() {
        let items = vec![
            ImageItem { pixels: vec![1.0; CHANNELS * 4 * 4], label: 0 },
            ImageItem { pixels: vec![2.0; CHANNELS * 4 * 4], label: 1 },
            ImageItem { pixels: vec![3.0; CHANNELS * 4 * 4], label: 1 },
        ];

        let batcher = ImageBatcher::<TestBackend>::new(Default::default(), 4);
        let batch   = batcher.batch(items);

        assert_eq!(batch.images.dims(), [3, CHANNELS, 4, 4]);
        assert_eq!(batch.len(), 3);

        let labels: Vec<i64> = batch
            .targets
            .into_data()
            .iter::<i64>()
            .collect();
        assert_eq!(labels, vec![0, 1, 1]);
    }
}
