use std::fmt;

use burn::prelude::*;
use burn::tensor::activation::sigmoid;

/// Added inside every logarithm of the BXE variant so a saturated sigmoid
/// gives a large finite loss instead of `-inf`.
pub const LOG_EPSILON: f64 = 1e-6;

/// Discriminator scores expressed relative to the opposite batch's mean.
#[derive(Debug, Clone)]
pub struct RelativisticOutputs<B: Backend> {
    /// `real - mean(fake)`, shape `[batch, 1]`.
    pub real_vs_fake: Tensor<B, 2>,
    /// `fake - mean(real)`, shape `[batch, 1]`.
    pub fake_vs_real: Tensor<B, 2>,
}

impl<B: Backend> RelativisticOutputs<B> {
    pub fn new(real_scores: Tensor<B, 2>, fake_scores: Tensor<B, 2>) -> Self {
        let real_mean = real_scores.clone().mean_dim(0);
        let fake_mean = fake_scores.clone().mean_dim(0);
        RelativisticOutputs {
            real_vs_fake: real_scores - fake_mean,
            fake_vs_real: fake_scores - real_mean,
        }
    }

    /// The same outputs with the roles of the real and fake batches exchanged.
    pub fn swapped(self) -> Self {
        RelativisticOutputs {
            real_vs_fake: self.fake_vs_real,
            fake_vs_real: self.real_vs_fake,
        }
    }
}

/// Relativistic-average loss family.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    clap::ValueEnum,
)]
pub enum LossKind {
    /// Binary cross entropy on sigmoid of the relativistic outputs.
    #[default]
    #[serde(rename = "BXE")]
    #[value(name = "BXE")]
    Bxe,
    /// Least squares with targets +1 / -1.
    #[serde(rename = "LS")]
    #[value(name = "LS")]
    Ls,
}

impl LossKind {
    pub fn name(self) -> &'static str {
        match self {
            LossKind::Bxe => "BXE",
            LossKind::Ls => "LS",
        }
    }

    /// Loss for the discriminator: real should look more real than the
    /// average fake, fake less real than the average real.
    pub fn discriminator_loss<B: Backend>(self, outputs: &RelativisticOutputs<B>) -> Tensor<B, 1> {
        self.paired(outputs.real_vs_fake.clone(), outputs.fake_vs_real.clone())
    }

    /// Loss for the generator: the discriminator objective with the real and
    /// fake relativistic terms exchanged.
    pub fn generator_loss<B: Backend>(self, outputs: &RelativisticOutputs<B>) -> Tensor<B, 1> {
        self.paired(outputs.fake_vs_real.clone(), outputs.real_vs_fake.clone())
    }

    /// Push `favored` towards the "real" target and `disfavored` towards the
    /// "fake" target. Returns a one-element tensor.
    fn paired<B: Backend>(self, favored: Tensor<B, 2>, disfavored: Tensor<B, 2>) -> Tensor<B, 1> {
        match self {
            LossKind::Bxe => {
                let favored = sigmoid(favored).add_scalar(LOG_EPSILON).log().mean();
                let disfavored = sigmoid(disfavored)
                    .neg()
                    .add_scalar(1.0 + LOG_EPSILON)
                    .log()
                    .mean();
                (favored + disfavored).neg()
            }
            LossKind::Ls => {
                let favored = favored.sub_scalar(1.0);
                let disfavored = disfavored.add_scalar(1.0);
                (favored.clone() * favored).mean() + (disfavored.clone() * disfavored).mean()
            }
        }
    }
}

impl fmt::Display for LossKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
