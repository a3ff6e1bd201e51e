//! # RaGAN
//!
//! Relativistic average GAN training on MNIST, Fashion-MNIST and CIFAR-10,
//! built on the Burn ML framework.
//!
//! ## Modules
//!
//! - [`data`] — Dataset selection, IDX/CIFAR decoding, shuffled batches
//! - [`gan`] — Generator, discriminator, relativistic losses, training step
//! - [`training`] — Epoch loop, loss history, rolling metrics
//! - [`artifacts`] — Sample-grid and loss-curve PNG rendering
//! - [`config`] — TOML configuration loading and validation
//! - [`error`] — Structured error types

#![recursion_limit = "256"]

pub mod artifacts;
pub mod config;
pub mod data;
pub mod error;
pub mod gan;
pub mod training;
