use std::path::PathBuf;

/// Errors that can occur while loading an image dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read dataset file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("bad IDX magic in {path}: expected 0x00000803, found {found:#010x}")]
    BadMagic { path: PathBuf, found: u32 },

    #[error("{path} is truncated: expected {expected} bytes, found {found}")]
    Truncated {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("image shape mismatch: {expected:?} vs {found:?}")]
    ShapeMismatch {
        expected: [usize; 3],
        found: [usize; 3],
    },

    #[error("dataset contains no images")]
    Empty,
}

/// Errors raised when no network layout fits the dataset's image shape.
#[derive(Debug, thiserror::Error)]
pub enum ArchitectureError {
    #[error("images must be square, got {height}x{width}")]
    NotSquare { height: usize, width: usize },

    #[error("image side {0} is not 7*2^k or 4*2^k (k >= 1)")]
    UnsupportedSize(usize),

    #[error("unsupported channel count {0} (expected 1 or 3)")]
    UnsupportedChannels(usize),
}

/// Errors that can occur while writing per-epoch artifacts.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("failed to encode image {path}: {source}")]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("failed to read generated images: {0}")]
    TensorData(String),

    #[error("failed to serialize loss history: {0}")]
    Pickle(#[from] serde_pickle::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur during training.
#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("dataset has {images} images, fewer than one minibatch of {minibatch}")]
    DatasetTooSmall { images: usize, minibatch: usize },

    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("architecture error: {0}")]
    Architecture(#[from] ArchitectureError),

    #[error("artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
