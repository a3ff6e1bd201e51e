//! Training infrastructure: the alternating epoch loop, the persisted loss
//! history, and rolling metrics for log output.

pub mod history;
pub mod metrics;
pub mod trainer;

pub use history::LossHistory;
pub use trainer::{Trainer, TrainerConfig};
