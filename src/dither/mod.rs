//! Reduce an RGBA picture to a strict black-and-white raster.

mod bayer;
mod diffusion;

use image::RgbaImage;
use log::{debug, warn};

use crate::color::pixel_luminance;
use crate::error::{ensure_area, Result};
use crate::raster::MonoRaster;
use crate::types::{Algorithm, DitherParameters};

pub use bayer::{bayer_matrix, ordered};
pub use diffusion::{
    error_diffusion, Kernel, Tap, ATKINSON, BURKES, FLOYD_STEINBERG, JARVIS, SIERRA, SIERRA_LITE,
    STUCKI,
};

/// Normalized luminance above which the flat threshold paints white.
pub const FLAT_CUTOFF: f32 = 0.4;

/// Side used by the legacy matrix when the caller gives none.
const LEGACY_MATRIX_SIZE: u32 = 8;

/// Run `algorithm` over `img` with `params`.
pub fn quantize(
    img: &RgbaImage,
    algorithm: Algorithm,
    params: &DitherParameters,
) -> Result<MonoRaster> {
    let (threshold, invert) = (params.threshold, params.invert);
    match algorithm {
        Algorithm::Threshold => flat_threshold(img, invert),
        Algorithm::ThresholdMatrix => threshold_matrix(img, params.matrix_size, threshold, invert),
        Algorithm::Ordered => ordered(img, params.bayer_size(), threshold, invert),
        Algorithm::FloydSteinberg => error_diffusion(img, &FLOYD_STEINBERG, threshold, invert),
        Algorithm::Atkinson => error_diffusion(img, &ATKINSON, threshold, invert),
        Algorithm::Jarvis => error_diffusion(img, &JARVIS, threshold, invert),
        Algorithm::Stucki => error_diffusion(img, &STUCKI, threshold, invert),
        Algorithm::Burkes => error_diffusion(img, &BURKES, threshold, invert),
        Algorithm::Sierra => error_diffusion(img, &SIERRA, threshold, invert),
        Algorithm::SierraLite => error_diffusion(img, &SIERRA_LITE, threshold, invert),
    }
}

/// Plain binarization: white when `luminance / 255 > 0.4`.
pub fn flat_threshold(img: &RgbaImage, invert: bool) -> Result<MonoRaster> {
    debug!("Flat threshold {}x{}", img.width(), img.height());
    MonoRaster::from_fn(img.width(), img.height(), |x, y| {
        (pixel_luminance(img.get_pixel(x, y)) / 255.0 > FLAT_CUTOFF) ^ invert
    })
}

/// The printer app's original dither: a linear ramp matrix
/// `m[i][j] = (i * N + j) / N^2` added to the truncated grey level,
/// white when `grey + m * 255 - threshold >= 0`.
pub fn threshold_matrix(
    img: &RgbaImage,
    matrix_size: u32,
    threshold: u8,
    invert: bool,
) -> Result<MonoRaster> {
    let (width, height) = img.dimensions();
    ensure_area(width, height)?;

    let n = if matrix_size == 0 {
        warn!("Matrix size 0, using {}", LEGACY_MATRIX_SIZE);
        LEGACY_MATRIX_SIZE as u64
    } else {
        matrix_size as u64
    };
    debug!(
        "Threshold matrix {}x{} size {} threshold {}",
        width, height, n, threshold
    );

    // n <= u32::MAX, so n * n fits in u64
    let cells = (n * n) as f32;
    let threshold = threshold as f32;

    MonoRaster::from_fn(width, height, |x, y| {
        let gray = pixel_luminance(img.get_pixel(x, y)) as i32;
        let m = ((y as u64 % n) * n + x as u64 % n) as f32 / cells;
        (gray as f32 + m * 255.0 - threshold >= 0.0) ^ invert
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gray_image(width: u32, height: u32, value: u8) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([value, value, value, 255]))
    }

    fn noise_image() -> RgbaImage {
        RgbaImage::from_fn(23, 11, |x, y| {
            let v = ((x * 37 + y * 91) % 256) as u8;
            Rgba([v, v.wrapping_mul(3), 255 - v, 255])
        })
    }

    #[test]
    fn test_flat_threshold_cutoff() {
        assert_eq!(flat_threshold(&gray_image(3, 3, 101), false).unwrap().ink_count(), 9);
        assert_eq!(flat_threshold(&gray_image(3, 3, 103), false).unwrap().ink_count(), 0);
        assert_eq!(flat_threshold(&gray_image(3, 3, 255), false).unwrap().ink_count(), 0);
    }

    #[test]
    fn test_flat_threshold_ignores_user_threshold() {
        let img = noise_image();
        let mut params = DitherParameters::default();
        let a = quantize(&img, Algorithm::Threshold, &params).unwrap();
        params.threshold = 10;
        let b = quantize(&img, Algorithm::Threshold, &params).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invert_complements_every_algorithm() {
        let img = noise_image();
        let mut params = DitherParameters::default();
        for index in 0..9u8 {
            let algorithm = Algorithm::from_index(index);
            params.invert = false;
            let plain = quantize(&img, algorithm, &params).unwrap();
            params.invert = true;
            let inverted = quantize(&img, algorithm, &params).unwrap();
            assert_eq!(inverted, plain.inverted(), "{:?}", algorithm);
            assert_eq!(plain.dimensions(), img.dimensions());
        }
    }

    #[test]
    fn test_threshold_matrix_ramp() {
        // m = [[0, .25], [.5, .75]]; grey 100 needs m * 255 >= 28
        let img = gray_image(2, 2, 100);
        let out = threshold_matrix(&img, 2, 128, false).unwrap();
        assert!(!out.is_white(0, 0));
        assert!(out.is_white(1, 0));
        assert!(out.is_white(0, 1));
        assert!(out.is_white(1, 1));
    }

    #[test]
    fn test_threshold_matrix_zero_size_falls_back() {
        let img = noise_image();
        assert_eq!(
            threshold_matrix(&img, 0, 200, false).unwrap(),
            threshold_matrix(&img, 8, 200, false).unwrap()
        );
    }

    #[test]
    fn test_threshold_matrix_accepts_huge_size() {
        // With N = u32::MAX the ramp is ~0 over a small picture.
        let params = DitherParameters {
            matrix_size: u32::MAX,
            ..DitherParameters::default()
        };
        let dark = quantize(&gray_image(4, 4, 100), Algorithm::ThresholdMatrix, &params).unwrap();
        assert_eq!(dark.ink_count(), 16);
        let light = quantize(&gray_image(4, 4, 200), Algorithm::ThresholdMatrix, &params).unwrap();
        assert_eq!(light.ink_count(), 0);
    }

    #[test]
    fn test_ordered_unsupported_size_uses_four() {
        let img = noise_image();
        let mut params = DitherParameters {
            matrix_size: 5,
            ..DitherParameters::default()
        };
        let fallback = quantize(&img, Algorithm::Ordered, &params).unwrap();
        params.matrix_size = 4;
        assert_eq!(fallback, quantize(&img, Algorithm::Ordered, &params).unwrap());
    }

    #[test]
    fn test_empty_image_is_rejected() {
        let empty = RgbaImage::new(0, 0);
        let params = DitherParameters::default();
        assert!(quantize(&empty, Algorithm::Threshold, &params).is_err());
        assert!(quantize(&empty, Algorithm::Atkinson, &params).is_err());
        assert!(quantize(&empty, Algorithm::Ordered, &params).is_err());
    }
}
