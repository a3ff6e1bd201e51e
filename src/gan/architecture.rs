use crate::error::ArchitectureError;

/// Latent dimension fed to the generator.
pub const LATENT_DIM: usize = 128;

/// Network layout derived from the dataset image shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Architecture {
    /// Side of the square tile the generator's dense projection reshapes into.
    pub base_size: usize,
    /// Channels of that tile; halved by every upsampling block.
    pub base_channels: usize,
    /// Number of stride-2 upsampling blocks (`log2(side / base_size)`).
    pub upsample_blocks: usize,
    /// Number of stride-2 convolutions in the discriminator.
    pub discriminator_layers: usize,
    pub image_channels: usize,
}

impl Architecture {
    /// Pick the layout for `[height, width, channels]` images.
    ///
    /// Sides of `7*2^k` use a 7x7x128 tile and a 2-layer discriminator (28 for
    /// the MNIST family); sides of `4*2^k` use a 4x4x512 tile and a 4-layer
    /// discriminator (32 for CIFAR-10).
    pub fn for_image(
        height: usize,
        width: usize,
        channels: usize,
    ) -> Result<Self, ArchitectureError> {
        if height != width {
            return Err(ArchitectureError::NotSquare { height, width });
        }
        if channels != 1 && channels != 3 {
            return Err(ArchitectureError::UnsupportedChannels(channels));
        }

        let (base_size, base_channels, discriminator_layers) =
            if upsample_steps(height, 7).is_some() {
                (7, 128, 2)
            } else if upsample_steps(height, 4).is_some() {
                (4, 512, 4)
            } else {
                return Err(ArchitectureError::UnsupportedSize(height));
            };
        let upsample_blocks = upsample_steps(height, base_size)
            .ok_or(ArchitectureError::UnsupportedSize(height))?;

        // The last block would have zero channels.
        if base_channels >> upsample_blocks == 0 {
            return Err(ArchitectureError::UnsupportedSize(height));
        }

        Ok(Architecture {
            base_size,
            base_channels,
            upsample_blocks,
            discriminator_layers,
            image_channels: channels,
        })
    }

    /// Channel count after upsampling block `i` (0-based).
    pub fn block_channels(&self, i: usize) -> usize {
        self.base_channels >> (i + 1)
    }
}

/// `Some(k)` when `size == base * 2^k` with `k >= 1`.
fn upsample_steps(size: usize, base: usize) -> Option<usize> {
    if size % base != 0 {
        return None;
    }
    let ratio = size / base;
    if ratio >= 2 && ratio.is_power_of_two() {
        Some(ratio.trailing_zeros() as usize)
    } else {
        None
    }
}
