//! The adversarial model: network definitions, layout derivation,
//! relativistic-average losses, and the phase-explicit training step.

pub mod architecture;
pub mod loss;
pub mod networks;
mod ragan;

pub use architecture::{Architecture, LATENT_DIM};
pub use loss::{LossKind, RelativisticOutputs};
pub use networks::{Discriminator, DiscriminatorConfig, Generator, GeneratorConfig};
pub use ragan::{OptimizerConfig, Phase, RaGan};
