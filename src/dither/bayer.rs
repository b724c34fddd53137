//! Ordered dithering with recursively generated Bayer matrices.

use image::RgbaImage;
use log::debug;

use crate::color::gray_level;
use crate::error::{ensure_area, Result};
use crate::raster::MonoRaster;
use crate::types::BayerSize;

const BASE: [[u32; 2]; 2] = [[0, 2], [3, 1]];

/// Generate the `side`x`side` Bayer index matrix.
///
/// Each quadrant of the 2N matrix is `4 * M(N)` plus 0 (top-left),
/// 2 (top-right), 3 (bottom-left) and 1 (bottom-right).
pub fn bayer_matrix(size: BayerSize) -> Vec<Vec<u32>> {
    build(size.side())
}

fn build(side: usize) -> Vec<Vec<u32>> {
    if side <= 2 {
        return BASE.iter().map(|row| row.to_vec()).collect();
    }

    let half = side / 2;
    let smaller = build(half);
    let mut result = vec![vec![0; side]; side];
    for (y, row) in smaller.iter().enumerate() {
        for (x, &v) in row.iter().enumerate() {
            result[y][x] = v * 4;
            result[y][x + half] = v * 4 + 2;
            result[y + half][x] = v * 4 + 3;
            result[y + half][x + half] = v * 4 + 1;
        }
    }
    result
}

/// Ordered dithering.
///
/// With `b = round(M[y % N][x % N] * 255 / N^2)`, a pixel is white when
/// `grey + b - threshold / 2 >= threshold`.
pub fn ordered(img: &RgbaImage, size: BayerSize, threshold: u8, invert: bool) -> Result<MonoRaster> {
    let (width, height) = img.dimensions();
    ensure_area(width, height)?;
    debug!(
        "Ordered dithering {}x{} matrix {} threshold {}",
        width,
        height,
        size.side(),
        threshold
    );

    let n = size.side();
    let cells = (n * n) as f32;
    let offsets: Vec<Vec<i32>> = bayer_matrix(size)
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|m| (m as f32 * 255.0 / cells).round() as i32)
                .collect()
        })
        .collect();

    let threshold = threshold as i32;
    MonoRaster::from_fn(width, height, |x, y| {
        let gray = gray_level(img.get_pixel(x, y));
        let bias = offsets[y as usize % n][x as usize % n];
        (gray + bias - threshold / 2 >= threshold) ^ invert
    })
}
