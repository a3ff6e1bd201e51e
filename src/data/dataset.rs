use std::ops::Range;

use burn::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::data::loader::RawImages;
use crate::error::DatasetError;

/// Concatenated, normalized image collection.
///
/// Pixels are scaled from `[0, 255]` to `[-1, 1]` once at construction and
/// never touched again. Shuffling permutes `order` in place; batches gather
/// images through it.
#[derive(Debug, Clone)]
pub struct ImageDataset {
    pixels: Vec<f32>,
    len: usize,
    channels: usize,
    height: usize,
    width: usize,
    order: Vec<usize>,
}

impl ImageDataset {
    /// Concatenate raw parts (all parts must share one image shape).
    pub fn from_parts(parts: Vec<RawImages>) -> Result<Self, DatasetError> {
        let shape = match parts.first() {
            Some(first) => first.shape,
            None => return Err(DatasetError::Empty),
        };
        let total: usize = parts.iter().map(|p| p.count).sum();
        if total == 0 {
            return Err(DatasetError::Empty);
        }

        let [channels, height, width] = shape;
        let mut pixels = Vec::with_capacity(total * channels * height * width);
        for part in &parts {
            if part.shape != shape {
                return Err(DatasetError::ShapeMismatch {
                    expected: shape,
                    found: part.shape,
                });
            }
            pixels.extend(part.pixels.iter().map(|&p| normalize(p)));
        }

        Ok(ImageDataset {
            pixels,
            len: total,
            channels,
            height,
            width,
            order: (0..total).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Logical `(N, H, W, C)` shape.
    pub fn shape(&self) -> [usize; 4] {
        [self.len, self.height, self.width, self.channels]
    }

    fn image_len(&self) -> usize {
        self.channels * self.height * self.width
    }

    /// Normalized pixels of image `index` (storage order, not shuffled order).
    pub fn image(&self, index: usize) -> &[f32] {
        let n = self.image_len();
        &self.pixels[index * n..(index + 1) * n]
    }

    pub fn values(&self) -> &[f32] {
        &self.pixels
    }

    /// Current visiting order.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Start a new epoch with a fresh random visiting order.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.order.shuffle(rng);
    }

    /// Gather the images at `positions` of the current order into a
    /// `[batch, channels, height, width]` tensor.
    pub fn batch<B: Backend>(&self, positions: Range<usize>, device: &B::Device) -> Tensor<B, 4> {
        let batch_size = positions.len();
        let mut data = Vec::with_capacity(batch_size * self.image_len());
        for &index in &self.order[positions] {
            data.extend_from_slice(self.image(index));
        }
        Tensor::from_data(
            TensorData::new(data, [batch_size, self.channels, self.height, self.width]),
            device,
        )
    }
}

fn normalize(pixel: u8) -> f32 {
    pixel as f32 / 255.0 * 2.0 - 1.0
}
