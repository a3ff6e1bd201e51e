use std::path::Path;

use image::{Rgb, RgbImage};

use crate::error::ArtifactError;
use crate::training::history::LossHistory;

pub const PLOT_WIDTH: u32 = 640;
pub const PLOT_HEIGHT: u32 = 480;

const MARGIN_LEFT: u32 = 60;
const MARGIN_RIGHT: u32 = 20;
const MARGIN_TOP: u32 = 20;
const MARGIN_BOTTOM: u32 = 40;
const GRID_LINES: u32 = 4;
const SWATCH: u32 = 12;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([0, 0, 0]);
const GRID: Rgb<u8> = Rgb([220, 220, 220]);
pub const DISCRIMINATOR_COLOR: Rgb<u8> = Rgb([31, 119, 180]);
pub const GENERATOR_COLOR: Rgb<u8> = Rgb([255, 127, 14]);

/// Line chart of both loss sequences. Each series is drawn against its own
/// step index on a shared x scale; the legend is a pair of colour swatches
/// in the top-right corner (discriminator above generator).
pub fn render_loss_plot(history: &LossHistory, width: u32, height: u32) -> RgbImage {
    let mut img = RgbImage::from_pixel(width, height, BACKGROUND);
    let area = PlotArea::new(width, height);

    let series = [
        (&history.discriminator_loss, DISCRIMINATOR_COLOR),
        (&history.generator_loss, GENERATOR_COLOR),
    ];
    let longest = series.iter().map(|(s, _)| s.len()).max().unwrap_or(0);
    let (y_min, y_max) = value_range(series.iter().flat_map(|(s, _)| s.iter().copied()));

    for i in 0..=GRID_LINES {
        let y = area.top + (area.bottom - area.top) * i / GRID_LINES;
        draw_line(&mut img, (area.left as i64, y as i64), (area.right as i64, y as i64), GRID);
    }
    draw_line(
        &mut img,
        (area.left as i64, area.top as i64),
        (area.left as i64, area.bottom as i64),
        AXIS,
    );
    draw_line(
        &mut img,
        (area.left as i64, area.bottom as i64),
        (area.right as i64, area.bottom as i64),
        AXIS,
    );

    let x_span = longest.saturating_sub(1).max(1) as f64;
    for (values, color) in series {
        let points: Vec<(i64, i64)> = values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .map(|(i, &v)| area.project(i as f64 / x_span, (v as f64 - y_min) / (y_max - y_min)))
            .collect();
        match points.as_slice() {
            [] => {}
            [only] => draw_line(&mut img, *only, *only, color),
            _ => {
                for pair in points.windows(2) {
                    draw_line(&mut img, pair[0], pair[1], color);
                }
            }
        }
    }

    let swatch_x = area.right.saturating_sub(SWATCH + 8);
    fill_rect(&mut img, swatch_x, area.top + 8, SWATCH, DISCRIMINATOR_COLOR);
    fill_rect(&mut img, swatch_x, area.top + 8 + SWATCH + 6, SWATCH, GENERATOR_COLOR);

    img
}

/// Write the loss chart as a `PLOT_WIDTH x PLOT_HEIGHT` PNG.
///
/// The discriminator curve is blue ([`DISCRIMINATOR_COLOR`]) and the
/// generator curve orange ([`GENERATOR_COLOR`]). The legend has no text:
/// its upper swatch is the discriminator, the lower one the generator.
pub fn save_loss_plot(history: &LossHistory, path: &Path) -> Result<(), ArtifactError> {
    render_loss_plot(history, PLOT_WIDTH, PLOT_HEIGHT)
        .save(path)
        .map_err(|e| ArtifactError::Image {
            path: path.to_path_buf(),
            source: e,
        })
}

struct PlotArea {
    left: u32,
    right: u32,
    top: u32,
    bottom: u32,
}

impl PlotArea {
    fn new(width: u32, height: u32) -> Self {
        PlotArea {
            left: MARGIN_LEFT.min(width.saturating_sub(1)),
            right: width.saturating_sub(MARGIN_RIGHT).max(MARGIN_LEFT.min(width)),
            top: MARGIN_TOP.min(height.saturating_sub(1)),
            bottom: height.saturating_sub(MARGIN_BOTTOM).max(MARGIN_TOP.min(height)),
        }
    }

    /// Map unit coordinates (origin bottom-left) to pixels.
    fn project(&self, fx: f64, fy: f64) -> (i64, i64) {
        let x = self.left as f64 + fx * (self.right - self.left) as f64;
        let y = self.bottom as f64 - fy * (self.bottom - self.top) as f64;
        (x.round() as i64, y.round() as i64)
    }
}

/// Min/max of the finite values, widened when degenerate.
fn value_range(values: impl Iterator<Item = f32>) -> (f64, f64) {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v as f64), hi.max(v as f64))
        });
    if !min.is_finite() {
        (0.0, 1.0)
    } else if max - min < 1e-12 {
        (min - 1.0, max + 1.0)
    } else {
        (min, max)
    }
}

/// Bresenham line, clipped to the image.
fn draw_line(img: &mut RgbImage, from: (i64, i64), to: (i64, i64), color: Rgb<u8>) {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
            img.put_pixel(x as u32, y as u32, color);
        }
        if x == to.0 && y == to.1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

fn fill_rect(img: &mut RgbImage, x0: u32, y0: u32, size: u32, color: Rgb<u8>) {
    for y in y0..(y0 + size).min(img.height()) {
        for x in x0..(x0 + size).min(img.width()) {
            img.put_pixel(x, y, color);
        }
    }
}
