use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use tracing::{debug, info};

use crate::artifacts::{save_loss_plot, save_sample_grid};
use crate::data::ImageDataset;
use crate::error::{ArtifactError, TrainingError};
use crate::gan::{Phase, RaGan, LATENT_DIM};
use crate::training::history::LossHistory;
use crate::training::metrics::{EpochTimer, LossMetrics};

pub const LOSS_PLOT_FILE: &str = "loss.png";
pub const LOSS_HISTORY_FILE: &str = "loss-history.pkl";

/// Trainer configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub epochs: usize,
    pub batch_size: usize,
    /// Discriminator steps per generator step.
    pub training_ratio: usize,
    /// The sample grid is `sample_rows x sample_rows` images.
    pub sample_rows: usize,
    /// RNG seed for shuffling and latent noise; OS entropy when absent.
    pub seed: Option<u64>,
    /// Window of the rolling loss averages in epoch logs.
    pub log_window: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            epochs: 100,
            batch_size: 64,
            training_ratio: 1,
            sample_rows: 10,
            seed: None,
            log_window: 100,
        }
    }
}

impl TrainerConfig {
    /// Images consumed per iteration: `training_ratio` discriminator batches
    /// plus one generator batch.
    pub fn minibatch_size(&self) -> usize {
        self.batch_size * (self.training_ratio + 1)
    }

    /// Full iterations per epoch; a trailing partial minibatch is skipped.
    pub fn iterations_per_epoch(&self, dataset_len: usize) -> usize {
        dataset_len / self.minibatch_size()
    }
}

/// Alternating RaGAN trainer.
///
/// Each epoch reshuffles the dataset and walks it in minibatches. Every
/// minibatch feeds `training_ratio` discriminator steps followed by one
/// generator step, each with fresh latent noise. At the end of every epoch
/// the sample grid, loss plot and loss history are written to `output_dir`.
pub struct Trainer {
    config: TrainerConfig,
    output_dir: PathBuf,
}

impl Trainer {
    pub fn new(config: TrainerConfig, output_dir: PathBuf) -> Self {
        Trainer { config, output_dir }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Run the full training loop and return the recorded loss history.
    pub fn train<B: AutodiffBackend>(
        &self,
        gan: &mut RaGan<B>,
        dataset: &mut ImageDataset,
        device: &B::Device,
    ) -> Result<LossHistory, TrainingError> {
        let batch_size = self.config.batch_size;
        let minibatch = self.config.minibatch_size();
        let iterations = self.config.iterations_per_epoch(dataset.len());
        if iterations == 0 {
            return Err(TrainingError::DatasetTooSmall {
                images: dataset.len(),
                minibatch,
            });
        }

        fs::create_dir_all(&self.output_dir)?;

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let sample_count = self.config.sample_rows * self.config.sample_rows;
        let sample_noise = sample_latent::<B::InnerBackend, _>(&mut rng, sample_count, device);

        let mut history = LossHistory::new();
        let mut metrics = LossMetrics::with_capacity(self.config.log_window);
        let window = self.config.log_window;

        info!(
            epochs = self.config.epochs,
            images = dataset.len(),
            iterations,
            minibatch,
            loss = %gan.loss_kind(),
            output = %self.output_dir.display(),
            "starting RaGAN training"
        );

        for epoch in 0..self.config.epochs {
            dataset.shuffle(&mut rng);
            info!("epoch {} of {}", epoch + 1, self.config.epochs);

            let mut timer = EpochTimer::start();
            let progress = progress_bar(iterations);

            for index in 0..iterations {
                let start = index * minibatch;

                for j in 0..self.config.training_ratio {
                    let offset = start + j * batch_size;
                    let real = dataset.batch::<B>(offset..offset + batch_size, device);
                    let noise = sample_latent::<B, _>(&mut rng, batch_size, device);
                    let loss = gan.step(Phase::Discriminator, real, noise);
                    history.record_discriminator(loss);
                    metrics.record_discriminator(loss);
                }

                let offset = start + self.config.training_ratio * batch_size;
                let real = dataset.batch::<B>(offset..offset + batch_size, device);
                let noise = sample_latent::<B, _>(&mut rng, batch_size, device);
                let loss = gan.step(Phase::Generator, real, noise);
                history.record_generator(loss);
                metrics.record_generator(loss);

                debug!(
                    epoch,
                    iteration = index,
                    d_loss = metrics.average_discriminator(1),
                    g_loss = loss,
                    "step"
                );
                progress.set_message(format!(
                    "d_loss: {:.4} g_loss: {:.4}",
                    metrics.average_discriminator(window),
                    metrics.average_generator(window)
                ));
                progress.inc(1);
            }
            progress.finish_and_clear();

            let artifacts_start = Instant::now();
            self.write_epoch_artifacts(gan, sample_noise.clone(), &history, epoch)?;
            timer.record_artifacts(artifacts_start.elapsed());

            info!(
                "epoch time: {:.2}s (artifacts {:.2}s) | d_loss({window}): {:.4} | g_loss({window}): {:.4}",
                timer.training_time().as_secs_f64(),
                timer.artifact_time().as_secs_f64(),
                metrics.average_discriminator(window),
                metrics.average_generator(window),
            );
        }

        info!(steps = metrics.total_steps(), "training complete");
        Ok(history)
    }

    fn write_epoch_artifacts<B: AutodiffBackend>(
        &self,
        gan: &RaGan<B>,
        sample_noise: Tensor<B::InnerBackend, 2>,
        history: &LossHistory,
        epoch: usize,
    ) -> Result<(), ArtifactError> {
        let generated = gan.generate(sample_noise);
        let [_, channels, height, width] = generated.dims();
        let pixels: Vec<f32> = generated
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| ArtifactError::TensorData(format!("{e:?}")))?;

        let grid_path = self.output_dir.join(format!("epoch_{:03}.png", epoch));
        save_sample_grid(
            &pixels,
            [channels, height, width],
            self.config.sample_rows,
            &grid_path,
        )?;
        debug!(path = %grid_path.display(), "saved sample grid");

        save_loss_plot(history, &self.output_dir.join(LOSS_PLOT_FILE))?;
        history.save_pickle(&self.output_dir.join(LOSS_HISTORY_FILE))?;
        Ok(())
    }
}

/// Standard normal latent batch `[batch, LATENT_DIM]`.
pub fn sample_latent<B: Backend, R: Rng + ?Sized>(
    rng: &mut R,
    batch_size: usize,
    device: &B::Device,
) -> Tensor<B, 2> {
    let data: Vec<f32> = (0..batch_size * LATENT_DIM)
        .map(|_| rng.sample(StandardNormal))
        .collect();
    Tensor::from_data(TensorData::new(data, [batch_size, LATENT_DIM]), device)
}

fn progress_bar(iterations: usize) -> ProgressBar {
    let progress = ProgressBar::new(iterations as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
    {
        progress.set_style(style.progress_chars("#>-"));
    }
    progress
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    use crate::data::RawImages;
    use crate::gan::{Architecture, LossKind, OptimizerConfig};

    type TestBackend = Autodiff<NdArray<f32>>;

    fn synthetic_dataset(count: usize) -> ImageDataset {
        let pixels = (0..count * 14 * 14).map(|i| (i % 251) as u8).collect();
        ImageDataset::from_parts(vec![RawImages {
            pixels,
            count,
            shape: [1, 14, 14],
        }])
        .unwrap()
    }

    fn small_config(epochs: usize, training_ratio: usize) -> TrainerConfig {
        TrainerConfig {
            epochs,
            batch_size: 2,
            training_ratio,
            sample_rows: 10,
            seed: Some(7),
            log_window: 10,
        }
    }

    fn run(
        config: TrainerConfig,
        dataset_len: usize,
        loss: LossKind,
        dir: &Path,
    ) -> Result<LossHistory, TrainingError> {
        let device = Default::default();
        let mut dataset = synthetic_dataset(dataset_len);
        let arch = Architecture {
            base_channels: 16,
            ..Architecture::for_image(14, 14, 1).unwrap()
        };
        let mut gan = RaGan::<TestBackend>::new(arch, loss, &OptimizerConfig::default(), &device);
        let trainer = Trainer::new(config, dir.join("out"));
        trainer.train(&mut gan, &mut dataset, &device)
    }

    #[test]
    fn test_minibatch_arithmetic() {
        let config = TrainerConfig {
            batch_size: 64,
            training_ratio: 2,
            ..Default::default()
        };
        assert_eq!(config.minibatch_size(), 192);
        assert_eq!(config.iterations_per_epoch(70_000), 364);
    }

    #[test]
    fn test_single_epoch_writes_exactly_three_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let history = run(small_config(1, 1), 8, LossKind::Bxe, dir.path()).unwrap();

        let out = dir.path().join("out");
        let mut names: Vec<String> = fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["epoch_000.png", "loss-history.pkl", "loss.png"]);

        let grid = image::open(out.join("epoch_000.png")).unwrap();
        assert_eq!((grid.width(), grid.height()), (140, 140));

        let saved = LossHistory::load_pickle(&out.join(LOSS_HISTORY_FILE)).unwrap();
        assert_eq!(saved, history);
    }

    #[test]
    fn test_history_counts_follow_training_ratio() {
        let dir = tempfile::tempdir().unwrap();
        // minibatch = 2 * (2 + 1) = 6, 13 images -> 2 iterations per epoch
        let history = run(small_config(2, 2), 13, LossKind::Ls, dir.path()).unwrap();
        assert_eq!(history.discriminator_loss.len(), 2 * 2 * 2);
        assert_eq!(history.generator_loss.len(), 2 * 2);
        assert!(history
            .discriminator_loss
            .iter()
            .chain(&history.generator_loss)
            .all(|v| v.is_finite()));

        let out = dir.path().join("out");
        assert!(out.join("epoch_000.png").exists());
        assert!(out.join("epoch_001.png").exists());
    }

    #[test]
    fn test_bxe_history_non_negative() {
        let dir = tempfile::tempdir().unwrap();
        let history = run(small_config(1, 1), 8, LossKind::Bxe, dir.path()).unwrap();
        assert!(history
            .discriminator_loss
            .iter()
            .chain(&history.generator_loss)
            .all(|&v| v > -1e-5));
    }

    #[test]
    fn test_rejects_dataset_smaller_than_minibatch() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(small_config(1, 1), 3, LossKind::Bxe, dir.path()).unwrap_err();
        assert!(matches!(
            err,
            TrainingError::DatasetTooSmall {
                images: 3,
                minibatch: 4
            }
        ));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_sample_latent_shape_and_seed() {
        let device = Default::default();
        let mut a = StdRng::seed_from_u64(1);
        let mut b = StdRng::seed_from_u64(1);
        let x = sample_latent::<NdArray<f32>, _>(&mut a, 3, &device);
        let y = sample_latent::<NdArray<f32>, _>(&mut b, 3, &device);
        assert_eq!(x.dims(), [3, LATENT_DIM]);
        let x: Vec<f32> = x.into_data().to_vec().unwrap();
        let y: Vec<f32> = y.into_data().to_vec().unwrap();
        assert_eq!(x, y);
    }
}
