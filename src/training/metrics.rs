use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Rolling loss averages for log output. The full history lives in
/// [`LossHistory`](crate::training::history::LossHistory); this only keeps
/// the most recent `capacity` values of each network.
pub struct LossMetrics {
    discriminator: VecDeque<f32>,
    generator: VecDeque<f32>,
    capacity: usize,
    total_steps: usize, // lifetime count, never capped
}

impl LossMetrics {
    pub fn with_capacity(capacity: usize) -> Self {
        LossMetrics {
            discriminator: VecDeque::with_capacity(capacity),
            generator: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            total_steps: 0,
        }
    }

    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn record_discriminator(&mut self, loss: f32) {
        self.total_steps += 1;
        push_capped(&mut self.discriminator, loss, self.capacity);
    }

    pub fn record_generator(&mut self, loss: f32) {
        self.total_steps += 1;
        push_capped(&mut self.generator, loss, self.capacity);
    }

    /// Average discriminator loss over the last N steps.
    pub fn average_discriminator(&self, last_n: usize) -> f32 {
        average(&self.discriminator, last_n)
    }

    /// Average generator loss over the last N steps.
    pub fn average_generator(&self, last_n: usize) -> f32 {
        average(&self.generator, last_n)
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }
}

impl Default for LossMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn push_capped(buf: &mut VecDeque<f32>, value: f32, capacity: usize) {
    buf.push_back(value);
    if buf.len() > capacity {
        buf.pop_front();
    }
}

fn average(buf: &VecDeque<f32>, last_n: usize) -> f32 {
    let n = buf.len().min(last_n);
    if n == 0 {
        return 0.0;
    }
    let sum: f32 = buf.iter().rev().take(n).sum();
    sum / n as f32
}

/// Wall-clock timing of epochs, with artifact writing tracked separately.
pub struct EpochTimer {
    epoch_start: Instant,
    artifact_time: Duration,
}

impl EpochTimer {
    pub fn start() -> Self {
        EpochTimer {
            epoch_start: Instant::now(),
            artifact_time: Duration::ZERO,
        }
    }

    /// Record time spent writing artifacts so it is excluded from the
    /// training time.
    pub fn record_artifacts(&mut self, d: Duration) {
        self.artifact_time += d;
    }

    /// Time spent in gradient steps since `start`.
    pub fn training_time(&self) -> Duration {
        self.epoch_start.elapsed().saturating_sub(self.artifact_time)
    }

    pub fn artifact_time(&self) -> Duration {
        self.artifact_time
    }
}
