use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::{
    Initializer, LeakyRelu, LeakyReluConfig, Linear, LinearConfig, PaddingConfig2d,
};
use burn::prelude::*;

use crate::gan::architecture::Architecture;

const START_CHANNELS: usize = 64;

/// Convolutional critic producing one unbounded realism logit per image.
///
/// ```text
/// Input:  [batch, C, H, W]
/// Convs:  n x (4x4 stride 2 conv, LeakyReLU 0.1), channels 64, 128, 256, ...
/// Pool:   global average over H, W  => [batch, channels]
/// Dense:  channels -> 1             => [batch, 1]
/// ```
#[derive(Module, Debug)]
pub struct Discriminator<B: Backend> {
    convs: Vec<Conv2d<B>>,
    activation: LeakyRelu,
    score: Linear<B>,
}

#[derive(Config, Debug)]
pub struct DiscriminatorConfig {
    pub image_channels: usize,
    pub layers: usize,
}

impl DiscriminatorConfig {
    pub fn from_architecture(arch: &Architecture) -> Self {
        DiscriminatorConfig {
            image_channels: arch.image_channels,
            layers: arch.discriminator_layers,
        }
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Discriminator<B> {
        let glorot = Initializer::XavierUniform { gain: 1.0 };

        let mut convs = Vec::with_capacity(self.layers);
        let mut channels_in = self.image_channels;
        for i in 0..self.layers {
            let channels_out = START_CHANNELS << i;
            convs.push(
                Conv2dConfig::new([channels_in, channels_out], [4, 4])
                    .with_stride([2, 2])
                    .with_padding(PaddingConfig2d::Explicit(1, 1))
                    .with_initializer(glorot.clone())
                    .init(device),
            );
            channels_in = channels_out;
        }

        Discriminator {
            convs,
            activation: LeakyReluConfig::new().with_negative_slope(0.1).init(),
            score: LinearConfig::new(channels_in, 1)
                .with_initializer(glorot)
                .init(device),
        }
    }
}

impl<B: Backend> Discriminator<B> {
    /// Forward pass: images [batch, C, H, W] -> logits [batch, 1].
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = images;
        for conv in &self.convs {
            x = self.activation.forward(conv.forward(x));
        }

        let [batch_size, channels, _, _] = x.dims();
        let pooled = x.mean_dim(3).mean_dim(2).reshape([batch_size, channels]);
        self.score.forward(pooled)
    }
}
