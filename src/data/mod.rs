//! Image datasets: selection, raw-file decoding, and the normalized,
//! shuffleable collection the trainer draws batches from.

pub mod dataset;
mod kind;
pub mod loader;

pub use dataset::ImageDataset;
pub use kind::DatasetKind;
pub use loader::{load_dataset, RawImages};
