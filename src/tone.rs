//! Brightness/contrast remapping and Sobel edge enhancement.

use image::{Rgba, RgbaImage};
use log::debug;

use crate::color::gray_level;
use crate::error::{ensure_area, Result};

const SOBEL_X: [[i32; 3]; 3] = [[-1, 0, 1], [-2, 0, 2], [-1, 0, 1]];
const SOBEL_Y: [[i32; 3]; 3] = [[-1, -2, -1], [0, 0, 0], [1, 2, 1]];

/// Per-channel affine remap of R, G and B; alpha is kept.
///
/// `brightness` shifts every channel by `brightness * 255 - 128`, then
/// `contrast` scales by `s = 2 * contrast` around `t = (0.5 - 0.5 * s) * 255`.
/// The result is clamped to `[0, 255]`. Note that neither `1.0/1.0` nor
/// `1.0/0.5` is an exact identity under this formula.
pub fn adjust_brightness_contrast(
    img: &RgbaImage,
    brightness: f32,
    contrast: f32,
) -> Result<RgbaImage> {
    ensure_area(img.width(), img.height())?;
    debug!("Brightness {} contrast {}", brightness, contrast);

    let offset = brightness * 255.0 - 128.0;
    let scale = contrast * 2.0;
    let translate = (-0.5 * scale + 0.5) * 255.0;
    let remap = |c: u8| (scale * (c as f32 + offset) + translate).clamp(0.0, 255.0).round() as u8;

    let mut out = img.clone();
    for pixel in out.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        *pixel = Rgba([remap(r), remap(g), remap(b), a]);
    }
    Ok(out)
}

/// Blend the Sobel gradient magnitude over the greyscale picture.
///
/// Interior pixels become `grey * (1 - intensity) + gradient * intensity`;
/// the outermost rows and columns keep their grey level since the kernel
/// has no support there. The output is greyscale with the source alpha.
pub fn sobel_edges(img: &RgbaImage, intensity: f32) -> Result<RgbaImage> {
    let (width, height) = img.dimensions();
    ensure_area(width, height)?;
    let intensity = intensity.clamp(0.0, 1.0);
    debug!("Sobel edges {}x{} intensity {}", width, height, intensity);

    let (w, h) = (width as usize, height as usize);
    let gray: Vec<i32> = img.pixels().map(gray_level).collect();

    let mut out = RgbaImage::from_fn(width, height, |x, y| {
        let v = gray[y as usize * w + x as usize] as u8;
        Rgba([v, v, v, img.get_pixel(x, y)[3]])
    });

    for y in 1..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            let mut sum_x = 0;
            let mut sum_y = 0;
            for (ky, (row_x, row_y)) in SOBEL_X.iter().zip(SOBEL_Y.iter()).enumerate() {
                for kx in 0..3 {
                    let g = gray[(y + ky - 1) * w + (x + kx - 1)];
                    sum_x += g * row_x[kx];
                    sum_y += g * row_y[kx];
                }
            }

            let gradient = (((sum_x * sum_x + sum_y * sum_y) as f64).sqrt() as i32).min(255);
            let current = gray[y * w + x];
            let v = (current as f32 * (1.0 - intensity) + gradient as f32 * intensity) as u8;

            let alpha = img.get_pixel(x as u32, y as u32)[3];
            out.put_pixel(x as u32, y as u32, Rgba([v, v, v, alpha]));
        }
    }
    Ok(out)
}
