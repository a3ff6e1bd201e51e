use std::path::Path;

use tracing::debug;

use crate::data::dataset::ImageDataset;
use crate::data::kind::DatasetKind;
use crate::error::DatasetError;

/// Magic number of an IDX file holding unsigned-byte rank-3 data.
pub const IDX_IMAGE_MAGIC: u32 = 0x0000_0803;

const IDX_HEADER_LEN: usize = 16;
const CIFAR_SIDE: usize = 32;
const CIFAR_CHANNELS: usize = 3;
const CIFAR_RECORD_LEN: usize = 1 + CIFAR_CHANNELS * CIFAR_SIDE * CIFAR_SIDE;

/// Undecoded 8-bit images, each stored channel-planar as `[c, h, w]`.
#[derive(Debug, Clone)]
pub struct RawImages {
    pub pixels: Vec<u8>,
    pub count: usize,
    /// `[channels, height, width]`
    pub shape: [usize; 3],
}

/// Load every part of `kind` from `data_dir/<name>/` and concatenate them.
pub fn load_dataset(kind: DatasetKind, data_dir: &Path) -> Result<ImageDataset, DatasetError> {
    let dir = data_dir.join(kind.name());
    let mut parts = Vec::with_capacity(kind.files().len());
    for file in kind.files() {
        let path = dir.join(file);
        let part = match kind {
            DatasetKind::Mnist | DatasetKind::FashionMnist => read_idx_images(&path)?,
            DatasetKind::Cifar10 => read_cifar_batch(&path)?,
        };
        debug!(path = %path.display(), images = part.count, "loaded dataset part");
        parts.push(part);
    }
    ImageDataset::from_parts(parts)
}

pub fn read_idx_images(path: &Path) -> Result<RawImages, DatasetError> {
    let bytes = read_file(path)?;
    parse_idx_images(path, &bytes)
}

/// Parse an uncompressed IDX3 image file (big-endian header: magic, count,
/// rows, cols, followed by `count*rows*cols` pixel bytes).
pub fn parse_idx_images(path: &Path, bytes: &[u8]) -> Result<RawImages, DatasetError> {
    if bytes.len() < IDX_HEADER_LEN {
        return Err(DatasetError::Truncated {
            path: path.to_path_buf(),
            expected: IDX_HEADER_LEN,
            found: bytes.len(),
        });
    }
    let word = |i: usize| {
        u32::from_be_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]])
    };

    let magic = word(0);
    if magic != IDX_IMAGE_MAGIC {
        return Err(DatasetError::BadMagic {
            path: path.to_path_buf(),
            found: magic,
        });
    }
    let count = word(4) as usize;
    let rows = word(8) as usize;
    let cols = word(12) as usize;

    // A corrupt header can claim more pixels than fit in memory.
    let expected = count
        .checked_mul(rows)
        .and_then(|n| n.checked_mul(cols))
        .and_then(|n| n.checked_add(IDX_HEADER_LEN))
        .unwrap_or(usize::MAX);
    if bytes.len() < expected {
        return Err(DatasetError::Truncated {
            path: path.to_path_buf(),
            expected,
            found: bytes.len(),
        });
    }

    Ok(RawImages {
        pixels: bytes[IDX_HEADER_LEN..expected].to_vec(),
        count,
        shape: [1, rows, cols],
    })
}

pub fn read_cifar_batch(path: &Path) -> Result<RawImages, DatasetError> {
    let bytes = read_file(path)?;
    parse_cifar_batch(path, &bytes)
}

/// Parse a CIFAR-10 binary batch: fixed-size records of one label byte and
/// 3072 channel-planar pixel bytes. Labels are dropped.
pub fn parse_cifar_batch(path: &Path, bytes: &[u8]) -> Result<RawImages, DatasetError> {
    if bytes.is_empty() || bytes.len() % CIFAR_RECORD_LEN != 0 {
        let records = bytes.len() / CIFAR_RECORD_LEN + 1;
        return Err(DatasetError::Truncated {
            path: path.to_path_buf(),
            expected: records * CIFAR_RECORD_LEN,
            found: bytes.len(),
        });
    }

    let count = bytes.len() / CIFAR_RECORD_LEN;
    let mut pixels = Vec::with_capacity(count * (CIFAR_RECORD_LEN - 1));
    for record in bytes.chunks_exact(CIFAR_RECORD_LEN) {
        pixels.extend_from_slice(&record[1..]);
    }

    Ok(RawImages {
        pixels,
        count,
        shape: [CIFAR_CHANNELS, CIFAR_SIDE, CIFAR_SIDE],
    })
}

fn read_file(path: &Path) -> Result<Vec<u8>, DatasetError> {
    std::fs::read(path).map_err(|e| DatasetError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx_bytes(count: u32, rows: u32, cols: u32, fill: u8) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&IDX_IMAGE_MAGIC.to_be_bytes());
        bytes.extend_from_slice(&count.to_be_bytes());
        bytes.extend_from_slice(&rows.to_be_bytes());
        bytes.extend_from_slice(&cols.to_be_bytes());
        bytes.extend(std::iter::repeat(fill).take((count * rows * cols) as usize));
        bytes
    }

    #[test]
    fn test_parse_idx_images() {
        let bytes = idx_bytes(3, 28, 28, 7);
        let raw = parse_idx_images(Path::new("x"), &bytes).unwrap();
        assert_eq!(raw.count, 3);
        assert_eq!(raw.shape, [1, 28, 28]);
        assert_eq!(raw.pixels.len(), 3 * 28 * 28);
        assert!(raw.pixels.iter().all(|&p| p == 7));
    }

    #[test]
    fn test_parse_idx_rejects_label_file() {
        let mut bytes = idx_bytes(1, 2, 2, 0);
        bytes[3] = 0x01; // 0x00000801 is the label-file magic
        let err = parse_idx_images(Path::new("labels"), &bytes).unwrap_err();
        assert!(matches!(err, DatasetError::BadMagic { found: 0x0801, .. }));
    }

    #[test]
    fn test_parse_idx_rejects_truncated_pixels() {
        let mut bytes = idx_bytes(2, 4, 4, 0);
        bytes.truncate(bytes.len() - 1);
        let err = parse_idx_images(Path::new("short"), &bytes).unwrap_err();
        match err {
            DatasetError::Truncated { expected, found, .. } => {
                assert_eq!(expected, 16 + 32);
                assert_eq!(found, 16 + 31);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_idx_rejects_overflowing_header() {
        let mut bytes = IDX_IMAGE_MAGIC.to_be_bytes().to_vec();
        for _ in 0..3 {
            bytes.extend_from_slice(&u32::MAX.to_be_bytes());
        }
        bytes.extend_from_slice(&[0; 8]);
        let err = parse_idx_images(Path::new("corrupt"), &bytes).unwrap_err();
        assert!(matches!(err, DatasetError::Truncated { found: 24, .. }));
    }

    #[test]
    fn test_parse_idx_rejects_short_header() {
        let err = parse_idx_images(Path::new("tiny"), &[0, 0, 8]).unwrap_err();
        assert!(matches!(err, DatasetError::Truncated { expected: 16, .. }));
    }

    #[test]
    fn test_parse_cifar_batch_drops_labels() {
        let mut bytes = Vec::new();
        for label in 0..2u8 {
            bytes.push(label);
            bytes.extend(std::iter::repeat(200u8).take(CIFAR_RECORD_LEN - 1));
        }
        let raw = parse_cifar_batch(Path::new("batch"), &bytes).unwrap();
        assert_eq!(raw.count, 2);
        assert_eq!(raw.shape, [3, 32, 32]);
        assert_eq!(raw.pixels.len(), 2 * 3072);
        assert!(raw.pixels.iter().all(|&p| p == 200));
    }

    #[test]
    fn test_parse_cifar_rejects_partial_record() {
        let bytes = vec![0u8; CIFAR_RECORD_LEN + 5];
        assert!(parse_cifar_batch(Path::new("batch"), &bytes).is_err());
    }

    #[test]
    fn test_load_dataset_concatenates_train_and_test() {
        let dir = tempfile::tempdir().unwrap();
        let mnist = dir.path().join("mnist");
        std::fs::create_dir_all(&mnist).unwrap();
        std::fs::write(mnist.join("train-images-idx3-ubyte"), idx_bytes(5, 28, 28, 0)).unwrap();
        std::fs::write(mnist.join("t10k-images-idx3-ubyte"), idx_bytes(2, 28, 28, 255)).unwrap();

        let dataset = load_dataset(DatasetKind::Mnist, dir.path()).unwrap();
        assert_eq!(dataset.len(), 7);
        assert_eq!(dataset.shape(), [7, 28, 28, 1]);
        assert!(dataset.image(0).iter().all(|&v| (v + 1.0).abs() < 1e-6));
        assert!(dataset.image(6).iter().all(|&v| (v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_load_dataset_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_dataset(DatasetKind::FashionMnist, dir.path()).unwrap_err();
        assert!(matches!(err, DatasetError::FileRead { .. }));
    }
}
