use std::path::Path;

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};

use crate::error::ArtifactError;

/// Tile `rows * rows` images into one square picture.
///
/// `images` holds the images back to back, each channel-planar
/// `[channels, height, width]` with values in `[-1, 1]`; they are mapped to
/// `[0, 1]` before quantization. Image `k` lands in grid column `k / rows`,
/// row `k % rows`, so each column is filled top to bottom.
pub fn render_grid(images: &[f32], shape: [usize; 3], rows: usize) -> DynamicImage {
    let [channels, height, width] = shape;
    let grid_w = (width * rows) as u32;
    let grid_h = (height * rows) as u32;
    let image_len = channels * height * width;
    let plane = height * width;

    let tile_origin = |k: usize| ((k / rows) * width, (k % rows) * height);
    let tiles = images.chunks_exact(image_len).take(rows * rows).enumerate();

    if channels == 1 {
        let mut grid = GrayImage::new(grid_w, grid_h);
        for (k, image) in tiles {
            let (x0, y0) = tile_origin(k);
            for y in 0..height {
                for x in 0..width {
                    let value = to_byte(image[y * width + x]);
                    grid.put_pixel((x0 + x) as u32, (y0 + y) as u32, Luma([value]));
                }
            }
        }
        DynamicImage::ImageLuma8(grid)
    } else {
        let mut grid = RgbImage::new(grid_w, grid_h);
        for (k, image) in tiles {
            let (x0, y0) = tile_origin(k);
            for y in 0..height {
                for x in 0..width {
                    let at = y * width + x;
                    let rgb = [
                        to_byte(image[at]),
                        to_byte(image[plane + at]),
                        to_byte(image[2 * plane + at]),
                    ];
                    grid.put_pixel((x0 + x) as u32, (y0 + y) as u32, Rgb(rgb));
                }
            }
        }
        DynamicImage::ImageRgb8(grid)
    }
}

/// Render and write the grid as PNG.
pub fn save_sample_grid(
    images: &[f32],
    shape: [usize; 3],
    rows: usize,
    path: &Path,
) -> Result<(), ArtifactError> {
    render_grid(images, shape, rows)
        .save(path)
        .map_err(|e| ArtifactError::Image {
            path: path.to_path_buf(),
            source: e,
        })
}

fn to_byte(value: f32) -> u8 {
    let unit = ((value + 1.0) / 2.0).clamp(0.0, 1.0);
    (unit * 255.0).round() as u8
}
