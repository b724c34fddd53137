//! RGB to luminance conversion shared by every stage.

use image::Rgba;

/// ITU-R BT.601 luma weights. Every stage depends on these exact values.
pub const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

/// Perceived brightness of an RGB triple, in `[0, 255]`.
#[inline]
pub fn luminance(r: u8, g: u8, b: u8) -> f32 {
    r as f32 * LUMA_WEIGHTS[0] + g as f32 * LUMA_WEIGHTS[1] + b as f32 * LUMA_WEIGHTS[2]
}

/// Luminance of a pixel; alpha is ignored.
#[inline]
pub fn pixel_luminance(pixel: &Rgba<u8>) -> f32 {
    let [r, g, b, _] = pixel.0;
    luminance(r, g, b)
}

/// Luminance rounded half-up to an integer grey level.
#[inline]
pub fn gray_level(pixel: &Rgba<u8>) -> i32 {
    pixel_luminance(pixel).round() as i32
}
