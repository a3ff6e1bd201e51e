use std::path::{Path, PathBuf};

use tracing::warn;

use crate::data::DatasetKind;
use crate::error::ConfigError;
use crate::gan::{LossKind, OptimizerConfig};
use crate::training::trainer::TrainerConfig;

/// Loss selection.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GanConfig {
    pub loss: LossKind,
}

/// Where images are read from.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub dataset: DatasetKind,
    /// Parent of the per-dataset directories (`<data_dir>/mnist/...`).
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            dataset: DatasetKind::default(),
            data_dir: PathBuf::from("data"),
        }
    }
}

/// Where artifacts are written.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Parent of the per-run `<dataset>_<loss>` directories.
    pub result_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            result_dir: PathBuf::from("result"),
        }
    }
}

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub training: TrainerConfig,
    pub optimizer: OptimizerConfig,
    pub gan: GanConfig,
    pub data: DataConfig,
    pub output: OutputConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!("config file '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.training.epochs == 0 {
            return Err(ConfigError::Validation(
                "training.epochs must be > 0".into(),
            ));
        }
        if self.training.batch_size == 0 {
            return Err(ConfigError::Validation(
                "training.batch_size must be > 0".into(),
            ));
        }
        if self.training.training_ratio == 0 {
            return Err(ConfigError::Validation(
                "training.training_ratio must be >= 1".into(),
            ));
        }
        if self.training.sample_rows == 0 {
            return Err(ConfigError::Validation(
                "training.sample_rows must be > 0".into(),
            ));
        }
        if self.training.log_window == 0 {
            return Err(ConfigError::Validation(
                "training.log_window must be > 0".into(),
            ));
        }

        if self.optimizer.learning_rate <= 0.0 {
            return Err(ConfigError::Validation(
                "optimizer.learning_rate must be > 0".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.optimizer.beta_1) {
            return Err(ConfigError::Validation(
                "optimizer.beta_1 must be in [0, 1)".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.optimizer.beta_2) {
            return Err(ConfigError::Validation(
                "optimizer.beta_2 must be in [0, 1)".into(),
            ));
        }

        Ok(())
    }

    /// `<result_dir>/<dataset>_<loss>`, e.g. `result/fashion_mnist_BXE`.
    pub fn run_dir(&self) -> PathBuf {
        self.output
            .result_dir
            .join(format!("{}_{}", self.data.dataset, self.gan.loss))
    }

    /// Generate a TOML string with all default values (useful for creating
    /// example config files).
    pub fn default_toml() -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        config.validate().expect("default config should be valid");
    }

    #[test]
    fn test_defaults_match_cli_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.training.epochs, 100);
        assert_eq!(config.training.batch_size, 64);
        assert_eq!(config.training.training_ratio, 1);
        assert!((config.optimizer.learning_rate - 2e-4).abs() < 1e-12);
        assert!((config.optimizer.beta_1 - 0.5).abs() < 1e-6);
        assert!((config.optimizer.beta_2 - 0.999).abs() < 1e-6);
        assert_eq!(config.gan.loss, LossKind::Bxe);
        assert_eq!(config.data.dataset, DatasetKind::FashionMnist);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_str = r#"
[optimizer]
learning_rate = 0.001

[gan]
loss = "LS"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert!((config.optimizer.learning_rate - 0.001).abs() < 1e-9);
        assert_eq!(config.gan.loss, LossKind::Ls);
        // Other fields should be defaults
        assert!((config.optimizer.beta_1 - 0.5).abs() < 1e-6);
        assert_eq!(config.training.epochs, 100);
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.training.batch_size, 64);
        assert_eq!(config.data.data_dir, PathBuf::from("data"));
        assert_eq!(config.output.result_dir, PathBuf::from("result"));
    }

    #[test]
    fn test_unknown_dataset_rejected_by_parser() {
        let result: Result<AppConfig, _> = toml::from_str("[data]\ndataset = \"svhn\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_run_dir_stamp() {
        let mut config = AppConfig::default();
        assert_eq!(config.run_dir(), PathBuf::from("result/fashion_mnist_BXE"));
        config.data.dataset = DatasetKind::Cifar10;
        config.gan.loss = LossKind::Ls;
        assert_eq!(config.run_dir(), PathBuf::from("result/cifar10_LS"));
    }

    #[test]
    fn test_validation_rejects_zero_epochs() {
        let mut config = AppConfig::default();
        config.training.epochs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_batch_size() {
        let mut config = AppConfig::default();
        config.training.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_training_ratio() {
        let mut config = AppConfig::default();
        config.training.training_ratio = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_negative_lr() {
        let mut config = AppConfig::default();
        config.optimizer.learning_rate = -0.001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_invalid_betas() {
        let mut config = AppConfig::default();
        config.optimizer.beta_1 = 1.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.optimizer.beta_2 = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_sample_rows() {
        let mut config = AppConfig::default();
        config.training.sample_rows = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = AppConfig::load_or_default(Path::new("nonexistent_config.toml")).unwrap();
        assert_eq!(config.training.epochs, 100);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ragan.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            r#"
[training]
epochs = 5
seed = 42

[data]
dataset = "cifar10"
"#
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.training.epochs, 5);
        assert_eq!(config.training.seed, Some(42));
        assert_eq!(config.data.dataset, DatasetKind::Cifar10);
        // Others are defaults
        assert!((config.optimizer.learning_rate - 2e-4).abs() < 1e-12);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ragan.toml");
        std::fs::write(&path, "[training]\nbatch_size = 0\n").unwrap();
        assert!(matches!(
            AppConfig::load(&path),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_default_toml_roundtrips() {
        let toml_str = AppConfig::default_toml().unwrap();
        let config: AppConfig = toml::from_str(&toml_str).unwrap();
        config.validate().expect("roundtripped config should be valid");
    }
}
