//! Image pipeline and wire encoder for the 240x96 Bluetooth sticker printer.
//!
//! [`convert`] turns any RGBA picture into a [`MonoRaster`] the size of the
//! label; [`render_frame`] additionally encodes it into the byte frame the
//! printer expects. Transport lives in [`printer`] (and [`ble`] behind the
//! `ble` feature).

pub mod color;
pub mod dither;
pub mod error;
pub mod geometry;
pub mod printer;
pub mod protocol;
pub mod raster;
pub mod tone;
pub mod types;

#[cfg(feature = "ble")]
pub mod ble;

use image::RgbaImage;
use log::debug;

pub use error::{Error, Result};
pub use raster::MonoRaster;
pub use types::{
    Algorithm, BayerSize, DitherParameters, PrintSettings, ScaleType, PRINTER_HEIGHT,
    PRINTER_WIDTH,
};

/// Run the whole conversion: rotation, orientation, scaling, tone, edges and
/// quantization, in that order.
pub fn convert(img: &RgbaImage, settings: &PrintSettings) -> Result<MonoRaster> {
    error::ensure_area(img.width(), img.height())?;
    debug!(
        "Converting {}x{} with {:?}/{:?}",
        img.width(),
        img.height(),
        settings.scale,
        settings.algorithm
    );

    let mut current = if settings.rotation.rem_euclid(360.0) != 0.0 {
        geometry::rotate(img, settings.rotation, geometry::WHITE)?
    } else {
        img.clone()
    };
    if settings.auto_rotate {
        current = geometry::auto_rotate(&current, PRINTER_WIDTH, PRINTER_HEIGHT)?;
    }
    current = geometry::scale(&current, settings.scale, PRINTER_WIDTH, PRINTER_HEIGHT)?;

    if let Some((brightness, contrast)) = settings.dither.tone() {
        current = tone::adjust_brightness_contrast(&current, brightness, contrast)?;
    }
    if let Some(intensity) = settings.dither.edges() {
        current = tone::sobel_edges(&current, intensity)?;
    }

    dither::quantize(&current, settings.algorithm, &settings.dither)
}

/// [`convert`] followed by [`protocol::encode`].
pub fn render_frame(img: &RgbaImage, settings: &PrintSettings) -> Result<Vec<u8>> {
    protocol::encode(&convert(img, settings)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(width: u32, height: u32, value: u8) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([value, value, value, 255]))
    }

    fn with_algorithm(algorithm: Algorithm) -> PrintSettings {
        PrintSettings {
            algorithm,
            ..PrintSettings::default()
        }
    }

    #[test]
    fn test_white_label_encodes_to_all_ones() {
        let frame = render_frame(&solid(240, 96, 255), &with_algorithm(Algorithm::Threshold))
            .unwrap();
        let mut expected = protocol::HEADER.to_vec();
        expected.extend(std::iter::repeat(0xff).take(2880));
        expected.extend_from_slice(&protocol::TRAILER);
        assert_eq!(frame, expected);
    }

    #[test]
    fn test_every_policy_but_scale_hits_the_label() {
        let img = solid(37, 53, 90);
        for scale in [ScaleType::Fit, ScaleType::Crop, ScaleType::Stretch] {
            for index in 0..9u8 {
                let settings = PrintSettings {
                    scale,
                    algorithm: Algorithm::from_index(index),
                    ..PrintSettings::default()
                };
                let raster = convert(&img, &settings).unwrap();
                assert_eq!(raster.dimensions(), (240, 96));
                assert_eq!(protocol::encode(&raster).unwrap().len(), protocol::FRAME_LEN);
            }
        }
    }

    #[test]
    fn test_scale_policy_short_side_is_rejected_by_encoder() {
        let settings = PrintSettings {
            scale: ScaleType::Scale,
            ..PrintSettings::default()
        };
        let raster = convert(&solid(100, 100, 255), &settings).unwrap();
        assert_eq!(raster.dimensions(), (96, 96));
        assert!(matches!(
            render_frame(&solid(100, 100, 255), &settings),
            Err(Error::ProfileMismatch { width: 96, height: 96 })
        ));
    }

    #[test]
    fn test_portrait_source_is_turned() {
        // Black top half becomes the right half after a clockwise quarter turn.
        let img = RgbaImage::from_fn(96, 240, |_, y| {
            if y < 120 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        let raster = convert(&img, &with_algorithm(Algorithm::Threshold)).unwrap();
        assert!(raster.is_white(10, 48));
        assert!(!raster.is_white(230, 48));

        let settings = PrintSettings {
            auto_rotate: false,
            ..with_algorithm(Algorithm::Threshold)
        };
        // Without the turn the picture is letterboxed in the middle.
        let raster = convert(&img, &settings).unwrap();
        assert!(raster.is_white(10, 48));
        assert!(raster.is_white(230, 48));
        assert!(!raster.is_white(120, 10));
    }

    #[test]
    fn test_tone_stage_runs_only_when_adjusted() {
        let img = solid(240, 96, 150);
        let mut settings = with_algorithm(Algorithm::Threshold);
        assert_eq!(convert(&img, &settings).unwrap().ink_count(), 0);

        settings.dither.brightness = 0.0;
        settings.dither.contrast = 0.5;
        assert_eq!(convert(&img, &settings).unwrap().ink_count(), 240 * 96);
    }

    #[test]
    fn test_tone_jumps_just_off_the_skip_point() {
        // 100 is below the flat cut; (1.0, 0.99) maps it to 255.
        let img = solid(240, 96, 100);
        let mut settings = with_algorithm(Algorithm::Threshold);
        assert_eq!(convert(&img, &settings).unwrap().ink_count(), 240 * 96);

        settings.dither.contrast = 0.99;
        assert_eq!(convert(&img, &settings).unwrap().ink_count(), 0);
    }

    #[test]
    fn test_invert_flips_the_whole_label() {
        let img = RgbaImage::from_fn(240, 96, |x, y| {
            let v = ((x * 5 + y * 3) % 256) as u8;
            Rgba([v, v, v, 255])
        });
        let mut settings = PrintSettings::default();
        let plain = convert(&img, &settings).unwrap();
        settings.dither.invert = true;
        assert_eq!(convert(&img, &settings).unwrap(), plain.inverted());
    }

    #[test]
    fn test_frame_decodes_to_converted_raster() {
        let img = RgbaImage::from_fn(300, 120, |x, y| {
            let v = ((x ^ y) % 256) as u8;
            Rgba([v, 255 - v, v / 2, 255])
        });
        let settings = with_algorithm(Algorithm::Atkinson);
        let raster = convert(&img, &settings).unwrap();
        let frame = render_frame(&img, &settings).unwrap();
        assert_eq!(protocol::decode(&frame).unwrap(), raster);
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert!(matches!(
            convert(&RgbaImage::new(0, 10), &PrintSettings::default()),
            Err(Error::EmptyRaster { .. })
        ));
    }
}
