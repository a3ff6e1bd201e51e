use std::fmt;

/// Which image collection to train on. Resolved once by the argument parser
/// or the config file.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, clap::ValueEnum,
)]
pub enum DatasetKind {
    #[serde(rename = "mnist")]
    #[value(name = "mnist")]
    Mnist,
    #[serde(rename = "fashion_mnist")]
    #[value(name = "fashion_mnist")]
    FashionMnist,
    #[serde(rename = "cifar10")]
    #[value(name = "cifar10")]
    Cifar10,
}

impl DatasetKind {
    /// Name used for the data subdirectory and the result stamp.
    pub fn name(self) -> &'static str {
        match self {
            DatasetKind::Mnist => "mnist",
            DatasetKind::FashionMnist => "fashion_mnist",
            DatasetKind::Cifar10 => "cifar10",
        }
    }

    /// Raw files making up the dataset, train parts first.
    pub fn files(self) -> &'static [&'static str] {
        match self {
            DatasetKind::Mnist | DatasetKind::FashionMnist => {
                &["train-images-idx3-ubyte", "t10k-images-idx3-ubyte"]
            }
            DatasetKind::Cifar10 => &[
                "data_batch_1.bin",
                "data_batch_2.bin",
                "data_batch_3.bin",
                "data_batch_4.bin",
                "data_batch_5.bin",
                "test_batch.bin",
            ],
        }
    }
}

impl Default for DatasetKind {
    fn default() -> Self {
        DatasetKind::FashionMnist
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
