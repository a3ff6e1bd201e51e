use burn::nn::conv::{ConvTranspose2d, ConvTranspose2dConfig};
use burn::nn::{BatchNorm, BatchNormConfig, Initializer, Linear, LinearConfig, Relu};
use burn::prelude::*;
use burn::tensor::activation::tanh;

use crate::gan::architecture::{Architecture, LATENT_DIM};

const GLOROT: Initializer = Initializer::XavierUniform { gain: 1.0 };

/// Glorot-uniform bounds for a transposed convolution. burn only hands the
/// initializer a fan-out for `Linear`/`Conv2d`, so `XavierUniform` cannot be
/// used here.
fn glorot_transposed(channels_in: usize, channels_out: usize, kernel: usize) -> Initializer {
    let fan_sum = ((channels_in + channels_out) * kernel * kernel) as f64;
    let bound = (6.0 / fan_sum).sqrt();
    Initializer::Uniform {
        min: -bound,
        max: bound,
    }
}

/// Stride-2 transposed convolution (ReLU) followed by batch normalization.
/// Doubles the spatial resolution.
#[derive(Module, Debug)]
pub struct UpsampleBlock<B: Backend> {
    deconv: ConvTranspose2d<B>,
    norm: BatchNorm<B, 2>,
    relu: Relu,
}

impl<B: Backend> UpsampleBlock<B> {
    fn new(channels_in: usize, channels_out: usize, device: &B::Device) -> Self {
        UpsampleBlock {
            deconv: ConvTranspose2dConfig::new([channels_in, channels_out], [4, 4])
                .with_stride([2, 2])
                .with_padding([1, 1])
                .with_initializer(glorot_transposed(channels_in, channels_out, 4))
                .init(device),
            // burn's momentum weights the new batch statistic: 0.1 here is a
            // 0.9 decay of the running average.
            norm: BatchNormConfig::new(channels_out)
                .with_momentum(0.1)
                .with_epsilon(2e-5)
                .init(device),
            relu: Relu::new(),
        }
    }

    fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.relu.forward(self.deconv.forward(input));
        self.norm.forward(x)
    }
}

/// DCGAN-style generator.
///
/// ```text
/// Input:   [batch, 128] latent
/// Dense:   128 -> base*base*base_channels, ReLU
/// Reshape: [batch, base_channels, base, base]
/// Blocks:  k x UpsampleBlock, channels halve, resolution doubles
/// Output:  3x3 transposed conv -> image channels, tanh  => [batch, C, H, W]
/// ```
#[derive(Module, Debug)]
pub struct Generator<B: Backend> {
    project: Linear<B>,
    blocks: Vec<UpsampleBlock<B>>,
    output: ConvTranspose2d<B>,
    relu: Relu,
    base_size: usize,
    base_channels: usize,
}

#[derive(Config, Debug)]
pub struct GeneratorConfig {
    pub latent_dim: usize,
    pub base_size: usize,
    pub base_channels: usize,
    pub upsample_blocks: usize,
    pub image_channels: usize,
}

impl GeneratorConfig {
    pub fn from_architecture(arch: &Architecture) -> Self {
        GeneratorConfig {
            latent_dim: LATENT_DIM,
            base_size: arch.base_size,
            base_channels: arch.base_channels,
            upsample_blocks: arch.upsample_blocks,
            image_channels: arch.image_channels,
        }
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Generator<B> {
        let projected = self.base_size * self.base_size * self.base_channels;

        let mut blocks = Vec::with_capacity(self.upsample_blocks);
        let mut channels = self.base_channels;
        for _ in 0..self.upsample_blocks {
            blocks.push(UpsampleBlock::new(channels, channels / 2, device));
            channels /= 2;
        }

        Generator {
            project: LinearConfig::new(self.latent_dim, projected)
                .with_initializer(GLOROT)
                .init(device),
            blocks,
            output: ConvTranspose2dConfig::new([channels, self.image_channels], [3, 3])
                .with_padding([1, 1])
                .with_initializer(glorot_transposed(channels, self.image_channels, 3))
                .init(device),
            relu: Relu::new(),
            base_size: self.base_size,
            base_channels: self.base_channels,
        }
    }
}

impl<B: Backend> Generator<B> {
    /// Forward pass: latent [batch, 128] -> images [batch, C, H, W] in (-1, 1).
    pub fn forward(&self, latent: Tensor<B, 2>) -> Tensor<B, 4> {
        let [batch_size, _] = latent.dims();

        let x = self.relu.forward(self.project.forward(latent));
        let mut x = x.reshape([
            batch_size,
            self.base_channels,
            self.base_size,
            self.base_size,
        ]);
        for block in &self.blocks {
            x = block.forward(x);
        }
        tanh(self.output.forward(x))
    }
}
