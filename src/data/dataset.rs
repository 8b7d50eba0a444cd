// ============================================================
// Layer 4 — Image Dataset (Dataset Adapter)
// ============================================================
// Maps an index to a decoded (image, label) pair. Images are
// decoded fresh on every access; nothing is cached, so memory
// stays flat no matter how large the table is.
//
// Decoding:
//   file → image crate → RGB8 → (resize if needed) → CHW f32
//
// Pixel values are kept in [0, 255]. The classifier is trained
// on raw intensities, no mean/std normalisation.
//
// Burn's Dataset::get returns Option, so a decode failure cannot
// be returned as an error from here. It is logged and surfaces
// as None; the training loop notices the short epoch and aborts.
//
// Reference: Burn Book §4 (Datasets)
//            image crate documentation

use std::path::Path;

use anyhow::{Context, Result};
use burn::data::dataset::Dataset;
use image::imageops::FilterType;

use crate::domain::sample::SampleRecord;

/// Number of colour channels in every decoded image
pub const CHANNELS: usize = 3;

/// One decoded sample, ready for the batcher.
#[derive(Debug, Clone)]
pub struct ImageItem {
    /// Pixel values in CHW order, length 3 * size * size
    pub pixels: Vec<f32>,

    /// Binary class: 0 or 1
    pub label: u8,
}

impl ImageItem {
    /// Decode an image file into a fixed `size` x `size` RGB item.
    pub fn load(path: &Path, label: u8, size: usize) -> Result<Self> {
        let img = image::open(path)
            .with_context(|| format!("Cannot decode image '{}'", path.display()))?;

        let side = size as u32;
        let img = if img.width() == side && img.height() == side {
            img
        } else {
            img.resize_exact(side, side, FilterType::Triangle)
        };
        let rgb = img.to_rgb8();

        // HWC (interleaved) → CHW (planar)
        let plane = size * size;
        let mut pixels = vec![0.0f32; CHANNELS * plane];
        for (x, y, px) in rgb.enumerate_pixels() {
            let offset = y as usize * size + x as usize;
            for c in 0..CHANNELS {
                pixels[c * plane + offset] = px[c] as f32;
            }
        }

        Ok(Self { pixels, label })
    }
}

pub struct ImageDataset {
    samples:    Vec<SampleRecord>,
    image_size: usize,
}

impl ImageDataset {
    pub fn new(samples: Vec<SampleRecord>, image_size: usize) -> Self {
        Self { samples, image_size }
    }

    pub fn sample_count(&self) -> usize { self.samples.len() }
}

impl Dataset<ImageItem> for ImageDataset {
    fn get(&self, index: usize) -> Option<ImageItem> {
        let sample = self.samples.get(index)?;
        match ImageItem::load(&sample.image_path, sample.label, self.image_size) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::error!("Sample {index}: {e:#}");
                None
            }
        }
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_item_has_fixed_shape_and_binary_label() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        RgbImage::from_pixel(8, 8, Rgb([10, 20, 30])).save(&path).unwrap();

        let dataset = ImageDataset::new(vec![SampleRecord::new(&path, "c", 1)], 8);
        let item    = dataset.get(0).unwrap();

        assert_eq!(item.pixels.len(), CHANNELS * 8 * 8);
        assert_eq!(item.label, 1);
        // Planar layout: first plane is all red, last plane all blue
        assert_eq!(item.pixels[0], 10.0);
        assert_eq!(item.pixels[64], 20.0);
        assert_eq!(item.pixels[CHANNELS * 64 - 1], 30.0);
    }

    #[test]
    fn test_wrong_size_is_resized() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        RgbImage::new(20, 10).save(&path).unwrap();

        let item = ImageItem::load(&path, 0, 16).unwrap();
        assert_eq!(item.pixels.len(), CHANNELS * 16 * 16);
    }

    #[test]
    fn test_undecodable_file_yields_none() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();

        let dataset = ImageDataset::new(vec![SampleRecord::new(&path, "c", 0)], 8);
        assert!(dataset.get(0).is_none());
        assert!(ImageItem::load(&path, 0, 8).is_err());
    }

    #[test]
    fn test_out_of_range_index() {
        let dataset = ImageDataset::new(Vec::new(), 8);
        assert!(dataset.get(0).is_none());
        assert_eq!(dataset.len(), 0);
    }
}
