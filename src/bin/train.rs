#![recursion_limit = "256"]

use std::path::PathBuf;

use anyhow::{Context, Result};
use burn::backend::{Autodiff, Wgpu};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use ragan::config::AppConfig;
use ragan::data::{load_dataset, DatasetKind};
use ragan::gan::{Architecture, LossKind, RaGan};
use ragan::training::trainer::Trainer;

type TrainBackend = Autodiff<Wgpu<f32, i32>>;

/// Train a relativistic average GAN on an image dataset.
#[derive(Parser)]
#[command(name = "train", about = "Train a relativistic average GAN")]
struct Cli {
    /// Number of passes over the dataset
    #[arg(long)]
    epochs: Option<usize>,

    /// Images per discriminator or generator step
    #[arg(long = "batch_size")]
    batch_size: Option<usize>,

    /// Discriminator steps per generator step
    #[arg(long = "training_ratio")]
    training_ratio: Option<usize>,

    /// Adam learning rate
    #[arg(long)]
    lr: Option<f64>,

    /// Adam first-moment decay
    #[arg(long = "beta_1")]
    beta_1: Option<f32>,

    /// Adam second-moment decay
    #[arg(long = "beta_2")]
    beta_2: Option<f32>,

    /// Loss: BXE for binary cross entropy, LS for least squares
    #[arg(long, value_enum)]
    loss: Option<LossKind>,

    /// Dataset: mnist, fashion_mnist or cifar10
    #[arg(long, value_enum)]
    dataset: Option<DatasetKind>,

    /// Path to TOML configuration file
    #[arg(long, default_value = "ragan.toml")]
    config: PathBuf,

    /// Log every training step
    #[arg(long)]
    verbose: bool,
}

impl Cli {
    /// Apply CLI overrides on top of the file configuration.
    fn apply(&self, config: &mut AppConfig) {
        if let Some(epochs) = self.epochs {
            config.training.epochs = epochs;
        }
        if let Some(batch_size) = self.batch_size {
            config.training.batch_size = batch_size;
        }
        if let Some(ratio) = self.training_ratio {
            config.training.training_ratio = ratio;
        }
        if let Some(lr) = self.lr {
            config.optimizer.learning_rate = lr;
        }
        if let Some(beta_1) = self.beta_1 {
            config.optimizer.beta_1 = beta_1;
        }
        if let Some(beta_2) = self.beta_2 {
            config.optimizer.beta_2 = beta_2;
        }
        if let Some(loss) = self.loss {
            config.gan.loss = loss;
        }
        if let Some(dataset) = self.dataset {
            config.data.dataset = dataset;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Load configuration
    let mut app_config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    cli.apply(&mut app_config);
    app_config.validate().context("validating configuration")?;

    let run_dir = app_config.run_dir();
    info!("{}_{}", app_config.data.dataset, app_config.gan.loss);

    let mut dataset = load_dataset(app_config.data.dataset, &app_config.data.data_dir)
        .with_context(|| {
            format!(
                "loading {} from {}",
                app_config.data.dataset,
                app_config.data.data_dir.display()
            )
        })?;
    info!(shape = ?dataset.shape(), "dataset loaded");

    let architecture = Architecture::for_image(dataset.height(), dataset.width(), dataset.channels())
        .context("deriving network layout")?;
    info!(?architecture, "network layout");

    let device = Default::default();
    let mut gan = RaGan::<TrainBackend>::new(
        architecture,
        app_config.gan.loss,
        &app_config.optimizer,
        &device,
    );

    let trainer = Trainer::new(app_config.training.clone(), run_dir);
    trainer
        .train(&mut gan, &mut dataset, &device)
        .context("training")?;

    info!("artifacts written to {}", trainer.output_dir().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_use_underscored_names() {
        let cli = Cli::try_parse_from([
            "train",
            "--dataset",
            "mnist",
            "--epochs",
            "1",
            "--batch_size",
            "32",
            "--training_ratio",
            "1",
            "--beta_1",
            "0.9",
            "--loss",
            "LS",
        ])
        .unwrap();
        let mut config = AppConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.data.dataset, DatasetKind::Mnist);
        assert_eq!(config.training.epochs, 1);
        assert_eq!(config.training.batch_size, 32);
        assert!((config.optimizer.beta_1 - 0.9).abs() < 1e-6);
        assert_eq!(config.gan.loss, LossKind::Ls);
        assert_eq!(config.run_dir(), PathBuf::from("result/mnist_LS"));
    }

    #[test]
    fn test_no_flags_keeps_config_values() {
        let cli = Cli::try_parse_from(["train"]).unwrap();
        let mut config = AppConfig::default();
        config.training.epochs = 7;
        cli.apply(&mut config);
        assert_eq!(config.training.epochs, 7);
        assert_eq!(config.data.dataset, DatasetKind::FashionMnist);
    }

    #[test]
    fn test_invalid_enum_values_rejected() {
        assert!(Cli::try_parse_from(["train", "--dataset", "svhn"]).is_err());
        assert!(Cli::try_parse_from(["train", "--loss", "bxe"]).is_err());
    }
}
