use burn::module::AutodiffModule;
use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{Adam, AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::ElementConversion;

use crate::gan::architecture::Architecture;
use crate::gan::loss::{LossKind, RelativisticOutputs};
use crate::gan::networks::{Discriminator, DiscriminatorConfig, Generator, GeneratorConfig};

/// Adam hyperparameters shared by both networks.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub learning_rate: f64,
    pub beta_1: f32,
    pub beta_2: f32,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig {
            learning_rate: 2e-4,
            beta_1: 0.5,
            beta_2: 0.999,
        }
    }
}

impl OptimizerConfig {
    fn adam(&self) -> AdamConfig {
        AdamConfig::new()
            .with_beta_1(self.beta_1)
            .with_beta_2(self.beta_2)
            .with_epsilon(1e-7)
    }
}

/// Which network a training step updates. The other network's parameters
/// are left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Discriminator,
    Generator,
}

/// Generator/discriminator pair with one Adam optimizer each.
pub struct RaGan<B: AutodiffBackend> {
    generator: Generator<B>,
    discriminator: Discriminator<B>,
    generator_optimizer: OptimizerAdaptor<Adam, Generator<B>, B>,
    discriminator_optimizer: OptimizerAdaptor<Adam, Discriminator<B>, B>,
    loss: LossKind,
    learning_rate: f64,
}

impl<B: AutodiffBackend> RaGan<B> {
    pub fn new(
        architecture: Architecture,
        loss: LossKind,
        optimizer: &OptimizerConfig,
        device: &B::Device,
    ) -> Self {
        RaGan {
            generator: GeneratorConfig::from_architecture(&architecture).init(device),
            discriminator: DiscriminatorConfig::from_architecture(&architecture).init(device),
            generator_optimizer: optimizer.adam().init(),
            discriminator_optimizer: optimizer.adam().init(),
            loss,
            learning_rate: optimizer.learning_rate,
        }
    }

    /// One gradient update of the network selected by `phase` on a batch of
    /// real images and an equally sized latent batch. Returns the loss value
    /// before the update.
    pub fn step(&mut self, phase: Phase, real_images: Tensor<B, 4>, noise: Tensor<B, 2>) -> f32 {
        match phase {
            Phase::Discriminator => {
                // No graph back into the generator.
                let fake_images = self.generator.forward(noise).detach();
                let outputs = self.relativistic_outputs(real_images, fake_images);
                let loss = self.loss.discriminator_loss(&outputs);
                let loss_val = scalar(&loss);

                let grads = GradientsParams::from_grads(loss.backward(), &self.discriminator);
                self.discriminator = self.discriminator_optimizer.step(
                    self.learning_rate,
                    self.discriminator.clone(),
                    grads,
                );
                loss_val
            }
            Phase::Generator => {
                let fake_images = self.generator.forward(noise);
                let outputs = self.relativistic_outputs(real_images, fake_images);
                let loss = self.loss.generator_loss(&outputs);
                let loss_val = scalar(&loss);

                // Only generator parameters are collected, so the
                // discriminator optimizer never sees these gradients.
                let grads = GradientsParams::from_grads(loss.backward(), &self.generator);
                self.generator =
                    self.generator_optimizer
                        .step(self.learning_rate, self.generator.clone(), grads);
                loss_val
            }
        }
    }

    fn relativistic_outputs(
        &self,
        real_images: Tensor<B, 4>,
        fake_images: Tensor<B, 4>,
    ) -> RelativisticOutputs<B> {
        let real_scores = self.discriminator.forward(real_images);
        let fake_scores = self.discriminator.forward(fake_images);
        RelativisticOutputs::new(real_scores, fake_scores)
    }

    /// Generate images in inference mode (running batch-norm statistics,
    /// no autodiff graph).
    pub fn generate(&self, noise: Tensor<B::InnerBackend, 2>) -> Tensor<B::InnerBackend, 4> {
        self.generator.valid().forward(noise)
    }

    pub fn generator(&self) -> &Generator<B> {
        &self.generator
    }

    pub fn discriminator(&self) -> &Discriminator<B> {
        &self.discriminator
    }

    pub fn loss_kind(&self) -> LossKind {
        self.loss
    }
}

fn scalar<B: Backend>(loss: &Tensor<B, 1>) -> f32 {
    loss.clone().into_scalar().elem::<f32>()
}
