//! Scaling and rotation that bring an arbitrary picture to the label geometry.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use log::debug;

use crate::error::{ensure_area, Result};
use crate::types::ScaleType;

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

// Bilinear resampling
const FILTER: FilterType = FilterType::Triangle;

/// Apply `scale_type` to bring `img` to `width`x`height`.
pub fn scale(img: &RgbaImage, scale_type: ScaleType, width: u32, height: u32) -> Result<RgbaImage> {
    match scale_type {
        ScaleType::Scale => scale_keep_aspect(img, width, height),
        ScaleType::Fit => fit(img, width, height),
        ScaleType::Crop => crop(img, width, height),
        ScaleType::Stretch => stretch(img, width, height),
    }
}

/// Scale preserving the aspect ratio so the result fits inside the target.
/// One side matches the target, the other may be shorter.
pub fn scale_keep_aspect(img: &RgbaImage, width: u32, height: u32) -> Result<RgbaImage> {
    let (src_w, src_h) = checked_dimensions(img, width, height)?;
    let source_ratio = src_w as f32 / src_h as f32;
    let target_ratio = width as f32 / height as f32;

    let (new_w, new_h) = if source_ratio > target_ratio {
        (width, (width as f32 / source_ratio) as u32)
    } else {
        ((height as f32 * source_ratio) as u32, height)
    };
    let (new_w, new_h) = (new_w.clamp(1, width), new_h.clamp(1, height));

    debug!("Scale {}x{} -> {}x{}", src_w, src_h, new_w, new_h);
    Ok(imageops::resize(img, new_w, new_h, FILTER))
}

/// Scale preserving the aspect ratio and centre on a white target-sized canvas.
pub fn fit(img: &RgbaImage, width: u32, height: u32) -> Result<RgbaImage> {
    fit_with_background(img, width, height, WHITE)
}

/// [`fit`] with a caller-chosen background.
pub fn fit_with_background(
    img: &RgbaImage,
    width: u32,
    height: u32,
    background: Rgba<u8>,
) -> Result<RgbaImage> {
    let (src_w, src_h) = checked_dimensions(img, width, height)?;
    let factor = (width as f32 / src_w as f32).min(height as f32 / src_h as f32);
    let new_w = ((src_w as f32 * factor) as u32).clamp(1, width);
    let new_h = ((src_h as f32 * factor) as u32).clamp(1, height);

    let resized = imageops::resize(img, new_w, new_h, FILTER);
    let mut canvas = RgbaImage::from_pixel(width, height, background);
    let left = (width - new_w) / 2;
    let top = (height - new_h) / 2;
    imageops::overlay(&mut canvas, &resized, left as i64, top as i64);

    debug!(
        "Fit {}x{} -> {}x{} at ({}, {}) on {}x{}",
        src_w, src_h, new_w, new_h, left, top, width, height
    );
    Ok(canvas)
}

/// Cut the centred region matching the target aspect ratio and scale it to
/// exactly the target size.
pub fn crop(img: &RgbaImage, width: u32, height: u32) -> Result<RgbaImage> {
    let (src_w, src_h) = checked_dimensions(img, width, height)?;
    let source_ratio = src_w as f32 / src_h as f32;
    let target_ratio = width as f32 / height as f32;

    let (x, y, w, h) = if source_ratio > target_ratio {
        // trim the sides
        let w = (src_h as f32 * target_ratio).round().clamp(1.0, src_w as f32) as u32;
        ((src_w - w) / 2, 0, w, src_h)
    } else {
        // trim top and bottom
        let h = (src_w as f32 / target_ratio).round().clamp(1.0, src_h as f32) as u32;
        (0, (src_h - h) / 2, src_w, h)
    };

    debug!(
        "Crop {}x{} to {}x{}+{}+{} -> {}x{}",
        src_w, src_h, w, h, x, y, width, height
    );
    let region = imageops::crop_imm(img, x, y, w, h).to_image();
    Ok(imageops::resize(&region, width, height, FILTER))
}

/// Scale each axis independently to exactly the target size.
pub fn stretch(img: &RgbaImage, width: u32, height: u32) -> Result<RgbaImage> {
    checked_dimensions(img, width, height)?;
    Ok(imageops::resize(img, width, height, FILTER))
}

fn is_landscape(width: u32, height: u32) -> bool {
    width > height
}

/// Turn the picture a quarter clockwise when its orientation (landscape or
/// portrait) disagrees with the target's; otherwise return it unchanged.
pub fn auto_rotate(img: &RgbaImage, width: u32, height: u32) -> Result<RgbaImage> {
    let (src_w, src_h) = checked_dimensions(img, width, height)?;
    if is_landscape(src_w, src_h) != is_landscape(width, height) {
        debug!("Orientation mismatch ({}x{}), rotating 90", src_w, src_h);
        Ok(imageops::rotate90(img))
    } else {
        Ok(img.clone())
    }
}

/// Rotate clockwise by a whole number of quarter turns.
pub fn rotate90(img: &RgbaImage, quarter_turns: i32) -> Result<RgbaImage> {
    ensure_area(img.width(), img.height())?;
    Ok(match quarter_turns.rem_euclid(4) {
        1 => imageops::rotate90(img),
        2 => imageops::rotate180(img),
        3 => imageops::rotate270(img),
        _ => img.clone(),
    })
}

/// Rotate clockwise by `degrees` about the centre.
///
/// The output grows to the bounding box of the rotated picture and the
/// uncovered corners take `background`. Multiples of 90 degrees are exact.
pub fn rotate(img: &RgbaImage, degrees: f32, background: Rgba<u8>) -> Result<RgbaImage> {
    let (src_w, src_h) = (img.width(), img.height());
    ensure_area(src_w, src_h)?;

    let degrees = degrees.rem_euclid(360.0);
    if degrees % 90.0 == 0.0 {
        return rotate90(img, (degrees / 90.0) as i32);
    }

    let theta = degrees.to_radians();
    let (cos, sin) = (theta.cos().abs(), theta.sin().abs());
    let out_w = (src_w as f32 * cos + src_h as f32 * sin).ceil().max(1.0) as u32;
    let out_h = (src_w as f32 * sin + src_h as f32 * cos).ceil().max(1.0) as u32;

    let projection = Projection::translate(out_w as f32 / 2.0, out_h as f32 / 2.0)
        * Projection::rotate(theta)
        * Projection::translate(-(src_w as f32) / 2.0, -(src_h as f32) / 2.0);

    let mut out = RgbaImage::from_pixel(out_w, out_h, background);
    warp_into(img, &projection, Interpolation::Bilinear, background, &mut out);

    debug!(
        "Rotate {}x{} by {} -> {}x{}",
        src_w, src_h, degrees, out_w, out_h
    );
    Ok(out)
}

fn checked_dimensions(img: &RgbaImage, width: u32, height: u32) -> Result<(u32, u32)> {
    ensure_area(img.width(), img.height())?;
    ensure_area(width, height)?;
    Ok(img.dimensions())
}
