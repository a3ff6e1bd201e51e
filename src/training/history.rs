use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ArtifactError;

/// Per-step loss values for both networks, in the order they were recorded.
///
/// Serialized as a Python pickle of
/// `{"discriminator_loss": [...], "generator_loss": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LossHistory {
    pub discriminator_loss: Vec<f32>,
    pub generator_loss: Vec<f32>,
}

impl LossHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_discriminator(&mut self, loss: f32) {
        self.discriminator_loss.push(loss);
    }

    pub fn record_generator(&mut self, loss: f32) {
        self.generator_loss.push(loss);
    }

    /// Write the pickle to `path`, replacing any previous file only once the
    /// new one is complete.
    pub fn save_pickle(&self, path: &Path) -> Result<(), ArtifactError> {
        let tmp_path = path.with_extension("pkl.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            serde_pickle::to_writer(&mut writer, self, serde_pickle::SerOptions::new())?;
        }
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    pub fn load_pickle(path: &Path) -> Result<Self, ArtifactError> {
        let reader = std::io::BufReader::new(File::open(path)?);
        Ok(serde_pickle::from_reader(reader, serde_pickle::DeOptions::new())?)
    }
}
